//! Roster commands: who races in which event

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::RaceDesk;
use crate::store::{Store, Write, WriteBatch};
use crate::timing::pairing::group_teams;
use crate::types::{Competitor, CompetitorId, Event, EventId, Millis, Race, RaceId, RaceMode, TeamId};
use crate::{RaceError, Result};

fn check_offset(offset: Option<Millis>) -> Result<()> {
    match offset {
        Some(ms) if ms < 0 => {
            Err(RaceError::validation("startOffset", format!("{ms} ms is negative")))
        }
        _ => Ok(()),
    }
}

fn check_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RaceError::validation("name", "must not be empty"));
    }
    Ok(name.to_string())
}

impl<S: Store> RaceDesk<S> {
    pub async fn add_competitor(&self, name: &str) -> Result<Competitor> {
        let competitor = Competitor::new(check_name(name)?);
        self.store
            .commit(WriteBatch::new("add_competitor").write(Write::PutCompetitor(competitor.clone())))
            .await?;
        debug!(competitor = %competitor.id, name = %competitor.name, "Competitor added");
        Ok(competitor)
    }

    pub async fn create_event(
        &self,
        name: &str,
        date: NaiveDate,
        level: u8,
        mode: RaceMode,
    ) -> Result<Event> {
        let event = Event::new(check_name(name)?, date, level, mode);
        self.store.commit(WriteBatch::new("create_event").put_event(event.clone())).await?;
        info!(event = %event.id, name = %event.name, %mode, "Event created");
        Ok(event)
    }

    /// Add one competitor to an event.
    ///
    /// The race inherits the event's mode. `start_offset` only matters for
    /// mass-start events.
    pub async fn add_participant(
        &self,
        event_id: EventId,
        competitor_id: CompetitorId,
        start_offset: Option<Millis>,
    ) -> Result<Race> {
        check_offset(start_offset)?;
        let event = self.event(event_id).await?;
        self.competitor(competitor_id).await?;

        let mut race = Race::new(event.id, competitor_id, event.mode);
        race.start_offset = start_offset;
        self.store
            .commit(WriteBatch::new("add_participant").expect_event(&event).put_race(race.clone()))
            .await?;
        debug!(race = %race.id, event = %event.id, competitor = %competitor_id, "Participant added");
        Ok(race)
    }

    /// Add two races pointing at each other as opponents.
    pub async fn add_duel(
        &self,
        event_id: EventId,
        first: CompetitorId,
        second: CompetitorId,
    ) -> Result<(Race, Race)> {
        if first == second {
            return Err(RaceError::validation("opponentId", "a competitor cannot duel themselves"));
        }
        let event = self.event(event_id).await?;
        self.competitor(first).await?;
        self.competitor(second).await?;

        let mut a = Race::new(event.id, first, event.mode);
        let mut b = Race::new(event.id, second, event.mode);
        a.opponent_id = Some(second);
        b.opponent_id = Some(first);

        self.store
            .commit(
                WriteBatch::new("add_duel").expect_event(&event).put_race(a.clone()).put_race(b.clone()),
            )
            .await?;
        debug!(event = %event.id, first = %a.id, second = %b.id, "Duel added");
        Ok((a, b))
    }

    /// Add a relay team, one race per passage numbered from 1 in the given
    /// order. A competitor may run more than one passage.
    pub async fn add_relay_team(
        &self,
        event_id: EventId,
        team_id: TeamId,
        members: &[CompetitorId],
    ) -> Result<Vec<Race>> {
        let event = self.event(event_id).await?;
        if event.mode != RaceMode::Relay {
            return Err(RaceError::unsupported("Relay teams", event.mode));
        }
        if members.is_empty() {
            return Err(RaceError::validation("teamMembers", "a team needs at least one member"));
        }
        for &member in members {
            self.competitor(member).await?;
        }

        let existing = self.races(event.id).await?;
        let teams = group_teams(&existing);
        if teams.iter().any(|team| team.team_id == team_id) {
            return Err(RaceError::validation("teamId", format!("team {team_id} already exists")));
        }
        if let Some(other) = teams.iter().find(|team| team.legs.len() != members.len()) {
            warn!(
                event = %event.id,
                team_id,
                legs = members.len(),
                other_team = other.team_id,
                other_legs = other.legs.len(),
                "Relay teams have different passage counts"
            );
        }

        let legs: Vec<Race> = members
            .iter()
            .zip(1u32..)
            .map(|(&competitor_id, passage)| {
                let mut race = Race::new(event.id, competitor_id, event.mode);
                race.team_id = Some(team_id);
                race.passage_number = Some(passage);
                race
            })
            .collect();

        let batch = legs
            .iter()
            .fold(WriteBatch::new("add_relay_team").expect_event(&event), |batch, race| {
                batch.put_race(race.clone())
            });
        self.store.commit(batch).await?;
        debug!(event = %event.id, team_id, legs = legs.len(), "Relay team added");
        Ok(legs)
    }

    /// Delete one race.
    ///
    /// A duel partner loses its opponent link and later passages of a relay
    /// team move up by one, in the same batch.
    pub async fn delete_race(&self, race_id: RaceId) -> Result<()> {
        let race = self.race(race_id).await?;
        let siblings = self.races(race.event_id).await?;
        let mut batch = WriteBatch::new("delete_race").expect_race(&race);

        if let Some(opponent) = race.opponent_id {
            let partner = siblings.iter().find(|other| {
                other.id != race.id
                    && other.competitor_id == opponent
                    && other.opponent_id == Some(race.competitor_id)
            });
            if let Some(partner) = partner {
                let mut unlinked = partner.clone();
                unlinked.opponent_id = None;
                batch = batch.expect_race(partner).put_race(unlinked);
            }
        }

        if let (Some(team_id), Some(passage)) = (race.team_id, race.passage_number) {
            for leg in siblings.iter().filter(|other| {
                other.team_id == Some(team_id)
                    && other.passage_number.is_some_and(|number| number > passage)
            }) {
                let mut moved = leg.clone();
                moved.passage_number = leg.passage_number.map(|number| number - 1);
                batch = batch.expect_race(leg).put_race(moved);
            }
        }

        let touched = batch.writes.len();
        self.store.commit(batch.write(Write::DeleteRace(race.id))).await?;
        debug!(race = %race.id, event = %race.event_id, relinked = touched, "Race deleted");
        Ok(())
    }

    /// Delete an event and every race that belongs to it.
    pub async fn delete_event(&self, event_id: EventId) -> Result<()> {
        let event = self.event(event_id).await?;
        self.store
            .commit(
                WriteBatch::new("delete_event")
                    .expect_event(&event)
                    .write(Write::DeleteRacesOf(event.id))
                    .write(Write::DeleteEvent(event.id)),
            )
            .await?;
        info!(event = %event.id, name = %event.name, "Event deleted");
        Ok(())
    }

    /// Wipe competitors, events and races.
    pub async fn clear_all(&self) -> Result<()> {
        self.store.commit(WriteBatch::new("clear_all").write(Write::Clear)).await?;
        info!("All records cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{desk_at, race_day, roster};
    use crate::timing::pairing::{check_passages, pair_duels};

    #[tokio::test]
    async fn duel_links_both_ways() {
        let (desk, _clock) = desk_at(0);
        let event = desk.create_event("Duels", race_day(), 1, RaceMode::Sprint).await.unwrap();
        let [ada, bea] = roster(&desk, ["Ada", "Bea"]).await;

        let (a, b) = desk.add_duel(event.id, ada, bea).await.unwrap();
        assert_eq!(a.opponent_id, Some(bea));
        assert_eq!(b.opponent_id, Some(ada));

        let races = desk.races(event.id).await.unwrap();
        let groups = pair_duels(&races);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].is_solo());
    }

    #[tokio::test]
    async fn duel_rejects_self_and_unknown_competitors() {
        let (desk, _clock) = desk_at(0);
        let event = desk.create_event("Duels", race_day(), 1, RaceMode::Sprint).await.unwrap();
        let [ada] = roster(&desk, ["Ada"]).await;

        assert!(matches!(
            desk.add_duel(event.id, ada, ada).await,
            Err(RaceError::Validation { .. })
        ));
        assert!(matches!(
            desk.add_duel(event.id, ada, CompetitorId::new()).await,
            Err(RaceError::NotFound { entity: "competitor", .. })
        ));
        assert!(desk.races(event.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_duel_race_unlinks_the_partner() {
        let (desk, _clock) = desk_at(0);
        let event = desk.create_event("Duels", race_day(), 1, RaceMode::Sprint).await.unwrap();
        let [ada, bea] = roster(&desk, ["Ada", "Bea"]).await;
        let (a, b) = desk.add_duel(event.id, ada, bea).await.unwrap();

        desk.delete_race(a.id).await.unwrap();
        let left = desk.races(event.id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
        assert_eq!(left[0].opponent_id, None);
    }

    #[tokio::test]
    async fn relay_team_numbers_passages_and_renumbers_on_delete() {
        let (desk, _clock) = desk_at(0);
        let event = desk.create_event("Relay", race_day(), 2, RaceMode::Relay).await.unwrap();
        let members = roster(&desk, ["Ada", "Bea", "Cid"]).await;

        let legs = desk.add_relay_team(event.id, 1, &members).await.unwrap();
        let numbers: Vec<_> = legs.iter().map(|race| race.passage_number).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);

        desk.delete_race(legs[0].id).await.unwrap();
        let races = desk.races(event.id).await.unwrap();
        check_passages(&races).unwrap();
        let bea = races.iter().find(|race| race.competitor_id == members[1]).unwrap();
        assert_eq!(bea.passage_number, Some(1));
    }

    #[tokio::test]
    async fn relay_team_needs_relay_event_and_fresh_team_id() {
        let (desk, _clock) = desk_at(0);
        let sprint = desk.create_event("Sprint", race_day(), 1, RaceMode::Sprint).await.unwrap();
        let relay = desk.create_event("Relay", race_day(), 1, RaceMode::Relay).await.unwrap();
        let members = roster(&desk, ["Ada", "Bea"]).await;

        assert!(matches!(
            desk.add_relay_team(sprint.id, 1, &members).await,
            Err(RaceError::Unsupported { .. })
        ));
        desk.add_relay_team(relay.id, 1, &members).await.unwrap();
        assert!(matches!(
            desk.add_relay_team(relay.id, 1, &members).await,
            Err(RaceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn relay_runner_may_run_twice() {
        let (desk, _clock) = desk_at(0);
        let relay = desk.create_event("Relay", race_day(), 1, RaceMode::Relay).await.unwrap();
        let [ada, bea] = roster(&desk, ["Ada", "Bea"]).await;

        let legs = desk.add_relay_team(relay.id, 1, &[ada, bea, ada]).await.unwrap();
        let passages: Vec<_> = legs.iter().map(|leg| (leg.competitor_id, leg.passage_number)).collect();
        assert_eq!(passages, vec![(ada, Some(1)), (bea, Some(2)), (ada, Some(3))]);
        assert_eq!(desk.races(relay.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_event_cascades() {
        let (desk, _clock) = desk_at(0);
        let doomed = desk.create_event("Doomed", race_day(), 1, RaceMode::Sprint).await.unwrap();
        let kept = desk.create_event("Kept", race_day(), 1, RaceMode::Sprint).await.unwrap();
        let [ada, bea] = roster(&desk, ["Ada", "Bea"]).await;
        desk.add_duel(doomed.id, ada, bea).await.unwrap();
        desk.add_participant(kept.id, ada, None).await.unwrap();

        desk.delete_event(doomed.id).await.unwrap();
        assert!(matches!(desk.event(doomed.id).await, Err(RaceError::NotFound { .. })));
        assert!(desk.races(doomed.id).await.unwrap().is_empty());
        assert_eq!(desk.races(kept.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_inputs_write_nothing() {
        let (desk, _clock) = desk_at(0);
        let event = desk.create_event("Pursuit", race_day(), 1, RaceMode::Pursuit).await.unwrap();
        let [ada] = roster(&desk, ["Ada"]).await;
        let before = desk.store().revision().await;

        assert!(desk.add_competitor("   ").await.is_err());
        assert!(desk.add_participant(event.id, ada, Some(-1)).await.is_err());
        assert!(desk.add_participant(EventId::new(), ada, None).await.is_err());
        assert_eq!(desk.store().revision().await, before);
    }

    #[tokio::test]
    async fn clear_all_empties_every_table() {
        let (desk, _clock) = desk_at(0);
        let event = desk.create_event("Sprint", race_day(), 1, RaceMode::Sprint).await.unwrap();
        let [ada] = roster(&desk, ["Ada"]).await;
        desk.add_participant(event.id, ada, None).await.unwrap();

        desk.clear_all().await.unwrap();
        assert_eq!(desk.store().snapshot().await.unwrap(), Default::default());
    }
}
