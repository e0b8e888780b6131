use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SchedulerError};
use crate::service::timezone;

/// Zones offered by the interactive picker.
pub const COMMON_TIMEZONES: [&str; 19] = [
    "UTC",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "America/Sao_Paulo",
    "Europe/London",
    "Europe/Paris",
    "Europe/Berlin",
    "Europe/Moscow",
    "Africa/Lagos",
    "Africa/Johannesburg",
    "Asia/Dubai",
    "Asia/Kolkata",
    "Asia/Bangkok",
    "Asia/Singapore",
    "Asia/Tokyo",
    "Australia/Sydney",
    "Pacific/Auckland",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub timezone: String,
    pub is_me: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailability: Option<String>,
}

impl Participant {
    pub fn new(name: &str, timezone: &str, unavailability: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            timezone: timezone.trim().to_string(),
            is_me: false,
            unavailability: clean_constraint(unavailability),
        }
    }

    /// Parses `NAME=ZONE` or `NAME=ZONE;CONSTRAINT`.
    pub fn parse_entry(entry: &str) -> Result<Self> {
        let Some((name, rest)) = entry.split_once('=') else {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "participant '{}' must look like NAME=ZONE[;CONSTRAINT]",
                entry
            )));
        };
        let (zone, constraint) = match rest.split_once(';') {
            Some((zone, constraint)) => (zone, Some(constraint)),
            None => (rest, None),
        };
        if name.trim().is_empty() {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "participant '{}' has no name",
                entry
            )));
        }
        timezone::parse_tz(zone.trim())?;
        Ok(Self::new(name, zone, constraint))
    }
}

fn clean_constraint(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// The participant list of one scheduling session.
///
/// Always holds exactly one local participant, which cannot be removed.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(local_name: &str, local_timezone: &str) -> Result<Self> {
        timezone::parse_tz(local_timezone)?;
        let mut me = Participant::new(local_name, local_timezone, None);
        me.is_me = true;
        Ok(Self {
            participants: vec![me],
        })
    }

    pub fn add(&mut self, name: &str, timezone: &str, unavailability: Option<&str>) -> Result<String> {
        timezone::parse_tz(timezone.trim())?;
        let participant = Participant::new(name, timezone, unavailability);
        let id = participant.id.clone();
        self.participants.push(participant);
        Ok(id)
    }

    pub fn push(&mut self, mut participant: Participant) -> Result<()> {
        timezone::parse_tz(&participant.timezone)?;
        participant.is_me = false;
        self.participants.push(participant);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Participant> {
        let idx = self
            .participants
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| SchedulerError::ParticipantNotFound(id.to_string()))?;
        if self.participants[idx].is_me {
            return Err(SchedulerError::LocalParticipantRemoval);
        }
        Ok(self.participants.remove(idx))
    }

    pub fn set_unavailability(&mut self, id: &str, text: Option<&str>) -> Result<()> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| SchedulerError::ParticipantNotFound(id.to_string()))?;
        participant.unavailability = clean_constraint(text);
        Ok(())
    }

    pub fn local(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_me)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn snapshot(&self) -> Vec<Participant> {
        self.participants.clone()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_starts_with_local_participant() {
        let roster = Roster::new("You", "Europe/Berlin").unwrap();
        assert_eq!(roster.len(), 1);
        let me = roster.local().unwrap();
        assert!(me.is_me);
        assert_eq!(me.timezone, "Europe/Berlin");
    }

    #[test]
    fn local_participant_cannot_be_removed() {
        let mut roster = Roster::new("You", "UTC").unwrap();
        let me_id = roster.local().unwrap().id.clone();
        assert_eq!(roster.remove(&me_id), Err(SchedulerError::LocalParticipantRemoval));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn add_and_remove_other_participant() {
        let mut roster = Roster::new("You", "UTC").unwrap();
        let id = roster.add("Ana", "America/Sao_Paulo", Some("  No Fridays ")).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(
            roster.participants()[1].unavailability.as_deref(),
            Some("No Fridays")
        );

        let removed = roster.remove(&id).unwrap();
        assert_eq!(removed.name, "Ana");
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn add_rejects_unknown_zone() {
        let mut roster = Roster::new("You", "UTC").unwrap();
        let err = roster.add("Bo", "Mars/Olympus", None).unwrap_err();
        assert_eq!(err, SchedulerError::InvalidTimezone("Mars/Olympus".to_string()));
    }

    #[test]
    fn constraint_edit_clears_blank_text() {
        let mut roster = Roster::new("You", "UTC").unwrap();
        let id = roster.add("Kai", "Asia/Tokyo", Some("busy after 4pm")).unwrap();
        roster.set_unavailability(&id, Some("   ")).unwrap();
        assert_eq!(roster.participants()[1].unavailability, None);
        assert!(matches!(
            roster.set_unavailability("missing", None),
            Err(SchedulerError::ParticipantNotFound(_))
        ));
    }

    #[test]
    fn parse_entry_reads_constraint() {
        let p = Participant::parse_entry("Ravi=Asia/Kolkata;no mondays").unwrap();
        assert_eq!(p.name, "Ravi");
        assert_eq!(p.timezone, "Asia/Kolkata");
        assert_eq!(p.unavailability.as_deref(), Some("no mondays"));
        assert!(!p.is_me);

        assert!(Participant::parse_entry("nobody").is_err());
        assert!(Participant::parse_entry("=UTC").is_err());
    }
}
