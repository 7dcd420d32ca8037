//! Duel and relay-team grouping
//!
//! Read-only views over an event's races. Nothing here writes; rank and points
//! assignment consume these groupings elsewhere.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::types::{Millis, Race, RaceId, TeamId};
use crate::{RaceError, Result};

/// A head-to-head pair, or a solo race when no opponent record exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DuelGroup<'a> {
    pub first: &'a Race,
    pub second: Option<&'a Race>,
}

impl<'a> DuelGroup<'a> {
    pub fn is_solo(&self) -> bool {
        self.second.is_none()
    }

    pub fn races(&self) -> impl Iterator<Item = &'a Race> + 'a {
        std::iter::once(self.first).chain(self.second)
    }
}

/// Group races into duels, visiting them in the given order.
///
/// Every race lands in exactly one group. A race whose opponent has no race
/// record in the slice, or whose opponent's race is already placed, stays solo.
pub fn pair_duels(races: &[Race]) -> Vec<DuelGroup<'_>> {
    let mut placed: HashSet<RaceId> = HashSet::with_capacity(races.len());
    let mut groups = Vec::new();

    for race in races {
        if !placed.insert(race.id) {
            continue;
        }
        let second = race.opponent_id.and_then(|opponent| {
            races.iter().find(|other| {
                other.id != race.id
                    && other.competitor_id == opponent
                    && !placed.contains(&other.id)
            })
        });
        if let Some(partner) = second {
            placed.insert(partner.id);
        }
        groups.push(DuelGroup { first: race, second });
    }
    groups
}

/// One relay team's legs in passage order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamGroup<'a> {
    pub team_id: TeamId,
    pub legs: Vec<&'a Race>,
}

impl TeamGroup<'_> {
    /// Eligible for ranking once every leg has finished.
    pub fn is_complete(&self) -> bool {
        !self.legs.is_empty() && self.legs.iter().all(|race| race.is_finished())
    }

    /// Summed leg time, once complete.
    pub fn total_time(&self) -> Option<Millis> {
        if !self.is_complete() {
            return None;
        }
        self.legs.iter().map(|race| race.total_time).sum()
    }

    pub fn penalty_count(&self) -> u32 {
        self.legs.iter().map(|race| race.penalty_count).sum()
    }

    /// Whether passages run 1, 2, .. n without gaps or repeats.
    pub fn passages_contiguous(&self) -> bool {
        self.legs.iter().enumerate().all(|(i, race)| race.passage_number == Some(i as u32 + 1))
    }
}

/// Group relay races by team, each team ordered by passage number.
pub fn group_teams(races: &[Race]) -> Vec<TeamGroup<'_>> {
    let mut teams: BTreeMap<TeamId, Vec<&Race>> = BTreeMap::new();
    for race in races {
        if let Some(team_id) = race.team_id {
            teams.entry(team_id).or_default().push(race);
        }
    }
    teams
        .into_iter()
        .map(|(team_id, mut legs)| {
            legs.sort_by_key(|race| race.passage_number.unwrap_or(u32::MAX));
            TeamGroup { team_id, legs }
        })
        .collect()
}

/// Check every team's passages are contiguous from 1.
pub fn check_passages(races: &[Race]) -> Result<()> {
    for team in group_teams(races) {
        if !team.passages_contiguous() {
            let numbers: Vec<_> = team.legs.iter().map(|race| race.passage_number).collect();
            return Err(RaceError::validation(
                "passageNumber",
                format!("team {} passages {:?} are not 1..{}", team.team_id, numbers, team.legs.len()),
            ));
        }
    }
    Ok(())
}

/// Finished races, fastest first. Ties keep their input order.
pub fn standings(races: &[Race]) -> Vec<&Race> {
    let mut finished: Vec<&Race> = races.iter().filter(|race| race.total_time.is_some()).collect();
    finished.sort_by_key(|race| race.total_time);
    finished
}

/// Complete relay teams, fastest first.
pub fn team_standings<'a>(teams: &'a [TeamGroup<'a>]) -> Vec<&'a TeamGroup<'a>> {
    let mut complete: Vec<_> = teams.iter().filter(|team| team.is_complete()).collect();
    complete.sort_by_key(|team| team.total_time());
    complete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompetitorId, EventId, RaceMode};
    use proptest::prelude::*;

    fn duel(event: EventId) -> (Race, Race) {
        let (a, b) = (CompetitorId::new(), CompetitorId::new());
        let mut first = Race::new(event, a, RaceMode::Sprint);
        let mut second = Race::new(event, b, RaceMode::Sprint);
        first.opponent_id = Some(b);
        second.opponent_id = Some(a);
        (first, second)
    }

    fn relay_leg(event: EventId, team: TeamId, passage: u32) -> Race {
        let mut race = Race::new(event, CompetitorId::new(), RaceMode::Relay);
        race.team_id = Some(team);
        race.passage_number = Some(passage);
        race
    }

    #[test]
    fn duel_partners_group_once() {
        let event = EventId::new();
        let (a, b) = duel(event);
        let solo = Race::new(event, CompetitorId::new(), RaceMode::Sprint);
        let races = vec![a.clone(), solo.clone(), b.clone()];

        let groups = pair_duels(&races);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].first.id, a.id);
        assert_eq!(groups[0].second.map(|r| r.id), Some(b.id));
        assert!(groups[1].is_solo());
        assert_eq!(groups[1].first.id, solo.id);
    }

    #[test]
    fn missing_opponent_record_is_solo() {
        let event = EventId::new();
        let mut lonely = Race::new(event, CompetitorId::new(), RaceMode::Sprint);
        lonely.opponent_id = Some(CompetitorId::new());
        let races = [lonely];
        let groups = pair_duels(&races);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_solo());
    }

    #[test]
    fn teams_sort_by_passage_and_need_all_finishes() {
        let event = EventId::new();
        let mut races = vec![
            relay_leg(event, 2, 1),
            relay_leg(event, 1, 2),
            relay_leg(event, 1, 1),
            Race::new(event, CompetitorId::new(), RaceMode::Relay),
        ];
        let teams = group_teams(&races);
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team_id, 1);
        assert_eq!(teams[0].legs.iter().map(|r| r.passage_number).collect::<Vec<_>>(), vec![
            Some(1),
            Some(2)
        ]);
        assert!(!teams[0].is_complete());

        for race in races.iter_mut().filter(|r| r.team_id == Some(1)) {
            race.splits.start = Some(0);
            race.splits.finish = Some(60_000);
            race.total_time = Some(60_000);
        }
        let teams = group_teams(&races);
        assert!(teams[0].is_complete());
        assert_eq!(teams[0].total_time(), Some(120_000));
        assert_eq!(team_standings(&teams).len(), 1);
    }

    #[test]
    fn passage_gaps_are_reported() {
        let event = EventId::new();
        let races = vec![relay_leg(event, 1, 1), relay_leg(event, 1, 3), relay_leg(event, 2, 1)];
        assert!(check_passages(&races).is_err());
        let races = vec![relay_leg(event, 1, 1), relay_leg(event, 1, 2), relay_leg(event, 2, 1)];
        assert!(check_passages(&races).is_ok());
    }

    #[test]
    fn standings_order_by_total_time() {
        let event = EventId::new();
        let mut slow = Race::new(event, CompetitorId::new(), RaceMode::Sprint);
        slow.total_time = Some(600_000);
        let mut fast = Race::new(event, CompetitorId::new(), RaceMode::Sprint);
        fast.total_time = Some(500_000);
        let unfinished = Race::new(event, CompetitorId::new(), RaceMode::Sprint);
        let races = vec![slow.clone(), unfinished, fast.clone()];

        let order: Vec<_> = standings(&races).into_iter().map(|r| r.id).collect();
        assert_eq!(order, vec![fast.id, slow.id]);
    }

    proptest! {
        #[test]
        fn prop_pairing_partitions_races(duels in 0usize..8, solos in 0usize..8, seed in any::<u64>()) {
            let event = EventId::new();
            let mut races = Vec::new();
            for _ in 0..duels {
                let (a, b) = duel(event);
                races.push(a);
                races.push(b);
            }
            for _ in 0..solos {
                races.push(Race::new(event, CompetitorId::new(), RaceMode::Sprint));
            }
            // deterministic shuffle
            let len = races.len();
            if len > 1 {
                let mut state = seed;
                for i in (1..len).rev() {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    races.swap(i, (state >> 33) as usize % (i + 1));
                }
            }

            let groups = pair_duels(&races);
            let mut seen = HashSet::new();
            for group in &groups {
                for race in group.races() {
                    prop_assert!(seen.insert(race.id), "race placed twice");
                }
                if let Some(second) = group.second {
                    prop_assert_eq!(group.first.opponent_id, Some(second.competitor_id));
                    prop_assert_eq!(second.opponent_id, Some(group.first.competitor_id));
                }
            }
            prop_assert_eq!(seen.len(), races.len());
            prop_assert_eq!(groups.len(), duels + solos);
        }
    }
}
