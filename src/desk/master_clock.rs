//! Master clock commands for mass-start events

use super::RaceDesk;
use crate::Result;
use crate::store::Store;
use crate::timing::pursuit::{self, ClockTransition};
use crate::types::EventId;

impl<S: Store> RaceDesk<S> {
    /// Start or resume the master clock, following the configured
    /// [`ResumePolicy`](crate::timing::ResumePolicy).
    pub async fn start_master_clock(&self, event_id: EventId) -> Result<ClockTransition> {
        let now = self.now();
        let policy = self.config.resume_policy;
        let (_, transition) = self
            .update_event(event_id, "start_master_clock", |event| {
                pursuit::start_clock(event, now, policy)
            })
            .await?;
        Ok(transition)
    }

    /// Stop the master clock. Captured checkpoints stay; unfinished race
    /// clocks freeze until it runs again.
    pub async fn stop_master_clock(&self, event_id: EventId) -> Result<ClockTransition> {
        let now = self.now();
        let (_, transition) = self
            .update_event(event_id, "stop_master_clock", |event| pursuit::stop_clock(event, now))
            .await?;
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RaceError;
    use crate::config::FiringlineConfig;
    use crate::test_utils::{desk_with, race_day};
    use crate::timing::ResumePolicy;
    use crate::types::RaceMode;

    #[tokio::test]
    async fn start_stop_start_rebaselines_by_default() {
        let (desk, clock) = desk_with(10_000, FiringlineConfig::default());
        let event = desk.create_event("Pursuit", race_day(), 2, RaceMode::Pursuit).await.unwrap();

        assert_eq!(
            desk.start_master_clock(event.id).await.unwrap(),
            ClockTransition::Started { epoch: 10_000 }
        );
        assert_eq!(desk.start_master_clock(event.id).await.unwrap(), ClockTransition::AlreadyRunning);

        clock.advance(30_000);
        assert_eq!(
            desk.stop_master_clock(event.id).await.unwrap(),
            ClockTransition::Stopped { elapsed: 30_000 }
        );
        assert_eq!(desk.stop_master_clock(event.id).await.unwrap(), ClockTransition::NotRunning);

        clock.advance(5_000);
        assert_eq!(
            desk.start_master_clock(event.id).await.unwrap(),
            ClockTransition::Started { epoch: 45_000 }
        );
    }

    #[tokio::test]
    async fn preserve_elapsed_shifts_epoch() {
        let config = FiringlineConfig { resume_policy: ResumePolicy::PreserveElapsed, ..Default::default() };
        let (desk, clock) = desk_with(10_000, config);
        let event = desk.create_event("Pursuit", race_day(), 2, RaceMode::Pursuit).await.unwrap();

        desk.start_master_clock(event.id).await.unwrap();
        clock.advance(30_000);
        desk.stop_master_clock(event.id).await.unwrap();
        clock.advance(5_000);
        desk.start_master_clock(event.id).await.unwrap();

        let event = desk.event(event.id).await.unwrap();
        assert_eq!(event.start_time, Some(15_000));
        assert_eq!(event.halt, None);
    }

    #[tokio::test]
    async fn sprint_has_no_master_clock() {
        let (desk, _clock) = desk_with(0, FiringlineConfig::default());
        let event = desk.create_event("Sprint", race_day(), 1, RaceMode::Sprint).await.unwrap();
        assert!(matches!(
            desk.start_master_clock(event.id).await,
            Err(RaceError::Unsupported { .. })
        ));
    }
}
