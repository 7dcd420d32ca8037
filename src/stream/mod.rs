//! Stream combinators for board feeds

pub mod settle;

pub use settle::{SettleExt, Settled, UntilSettled};
