use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Timelike};
use chrono_tz::Tz;

use crate::error::{Result, SchedulerError};
use crate::models::participant::Participant;
use crate::models::schedule::{HourCategory, ParticipantHourInfo, SlotScore};
use crate::service::classifier::HourClassifier;
use crate::service::timezone;

/// A participant whose zone has already been parsed.
#[derive(Debug, Clone)]
pub struct ResolvedParticipant<'a> {
    pub participant: &'a Participant,
    pub tz: Tz,
}

pub fn resolve(participants: &[Participant]) -> Result<Vec<ResolvedParticipant<'_>>> {
    participants
        .iter()
        .map(|participant| {
            Ok(ResolvedParticipant {
                participant,
                tz: timezone::parse_tz(&participant.timezone)?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapScorer {
    classifier: HourClassifier,
}

impl OverlapScorer {
    pub fn new(classifier: HourClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &HourClassifier {
        &self.classifier
    }

    pub fn score(&self, utc_hour: u32, date: NaiveDate, participants: &[Participant]) -> Result<SlotScore> {
        let resolved = resolve(participants)?;
        self.score_resolved(utc_hour, date, &resolved)
    }

    /// The 24 slots of one UTC day.
    pub fn day_grid(&self, date: NaiveDate, participants: &[Participant]) -> Result<Vec<SlotScore>> {
        let resolved = resolve(participants)?;
        (0..24)
            .map(|hour| self.score_resolved(hour, date, &resolved))
            .collect()
    }

    pub fn score_resolved(
        &self,
        utc_hour: u32,
        date: NaiveDate,
        participants: &[ResolvedParticipant<'_>],
    ) -> Result<SlotScore> {
        if participants.is_empty() {
            return Err(SchedulerError::InsufficientParticipants);
        }

        let mut breakdown = Vec::with_capacity(participants.len());
        let mut offsets = Vec::with_capacity(participants.len());
        for resolved in participants {
            let local: DateTime<Tz> = timezone::local_datetime(utc_hour, date, resolved.tz)?;
            offsets.push(timezone::offset_minutes(utc_hour, date, resolved.tz)?);
            breakdown.push(ParticipantHourInfo {
                participant_id: resolved.participant.id.clone(),
                participant_name: resolved.participant.name.clone(),
                local_hour: local.hour(),
                category: self.classifier.classify(local.hour()),
            });
        }

        let total: f64 = breakdown.iter().map(|info| info.category.weight()).sum();
        let score = total / breakdown.len() as f64;
        let rationale = rationale_for(&breakdown);

        Ok(SlotScore {
            utc_hour,
            date: Some(date),
            participants: breakdown,
            score,
            rationale,
            midday_distance: midday_distance(utc_hour, majority_offset(&offsets)),
        })
    }
}

/// Most common UTC offset; ties go to the smallest offset so the result does
/// not depend on participant order.
fn majority_offset(offsets: &[i32]) -> i32 {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for offset in offsets {
        *counts.entry(*offset).or_default() += 1;
    }
    let mut best = (0, 0usize);
    for (offset, count) in counts {
        if count > best.1 {
            best = (offset, count);
        }
    }
    best.0
}

fn midday_distance(utc_hour: u32, offset_minutes: i32) -> u32 {
    let day = 24 * 60;
    let noon_utc = (12 * 60 - offset_minutes).rem_euclid(day);
    let slot = (utc_hour as i32) * 60;
    let diff = (slot - noon_utc).rem_euclid(day);
    diff.min(day - diff) as u32
}

fn join_names(names: &[&str]) -> String {
    let mut sorted = names.to_vec();
    sorted.sort_unstable();
    sorted.join(", ")
}

fn names_in<'a>(breakdown: &'a [ParticipantHourInfo], category: HourCategory) -> Vec<&'a str> {
    breakdown
        .iter()
        .filter(|info| info.category == category)
        .map(|info| info.participant_name.as_str())
        .collect()
}

pub fn rationale_for(breakdown: &[ParticipantHourInfo]) -> String {
    let total = breakdown.len();
    let working = names_in(breakdown, HourCategory::Working);
    let sleeping = names_in(breakdown, HourCategory::Sleeping);

    if working.len() == total {
        return "Within working hours for everyone".to_string();
    }
    if sleeping.is_empty() {
        return format!(
            "Everyone is awake; {} of {} within working hours",
            working.len(),
            total
        );
    }
    if sleeping.len() == total {
        return "Outside waking hours for everyone".to_string();
    }
    format!(
        "{} of {} within working hours; sleeping: {}",
        working.len(),
        total,
        join_names(&sleeping)
    )
}

pub fn impact_for(breakdown: &[ParticipantHourInfo]) -> String {
    let waking = names_in(breakdown, HourCategory::Waking);
    let sleeping = names_in(breakdown, HourCategory::Sleeping);
    match (waking.is_empty(), sleeping.is_empty()) {
        (true, true) => "No one is outside working hours".to_string(),
        (false, true) => format!("Outside working hours for {}", join_names(&waking)),
        (true, false) => format!("Asleep: {}", join_names(&sleeping)),
        (false, false) => format!(
            "Asleep: {}; outside working hours for {}",
            join_names(&sleeping),
            join_names(&waking)
        ),
    }
}
