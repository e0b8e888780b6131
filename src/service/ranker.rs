use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{Result, SchedulerError};
use crate::models::participant::Participant;
use crate::models::schedule::{DateRange, HourCategory, SlotScore, Suggestion};
use crate::service::constraints::{parse_constraint, ParsedConstraint};
use crate::service::overlap::{impact_for, OverlapScorer, ResolvedParticipant};
use crate::service::timezone;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingOptions {
    pub top_k: usize,
    /// Slots must score strictly above this to be suggested.
    pub min_score: f64,
    /// Drop participants with unknown zones instead of failing the run.
    pub skip_invalid_timezones: bool,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_score: 0.0,
            skip_invalid_timezones: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SlotRanker {
    scorer: OverlapScorer,
    options: RankingOptions,
}

impl SlotRanker {
    pub fn new(scorer: OverlapScorer, options: RankingOptions) -> Self {
        Self { scorer, options }
    }

    pub fn options(&self) -> &RankingOptions {
        &self.options
    }

    pub fn scorer(&self) -> &OverlapScorer {
        &self.scorer
    }

    pub fn rank(&self, participants: &[Participant], range: &DateRange) -> Result<Vec<Suggestion>> {
        Ok(self
            .rank_slots(participants, range)?
            .iter()
            .map(to_suggestion)
            .collect())
    }

    /// Best slots, at most one per UTC hour, best first.
    pub fn rank_slots(&self, participants: &[Participant], range: &DateRange) -> Result<Vec<SlotScore>> {
        if participants.is_empty() {
            return Err(SchedulerError::InsufficientParticipants);
        }
        let resolved = self.resolve(participants)?;
        if resolved.is_empty() {
            return Err(SchedulerError::InsufficientParticipants);
        }

        let constraints: Vec<ParsedConstraint> = resolved
            .iter()
            .map(|r| {
                let text = r.participant.unavailability.as_deref().unwrap_or("");
                let parsed = parse_constraint(text);
                if !text.trim().is_empty() && !parsed.is_recognized() {
                    debug!(participant = %r.participant.name, text, "Unavailability not understood locally");
                }
                parsed
            })
            .collect();

        let mut candidates: Vec<SlotScore> = Vec::new();
        let mut excluded = 0usize;
        for date in range.days() {
            for hour in 0..24 {
                if self.is_excluded(hour, date, &resolved, &constraints)? {
                    excluded += 1;
                    continue;
                }
                let slot = self.scorer.score_resolved(hour, date, &resolved)?;
                if slot.score > self.options.min_score {
                    candidates.push(slot);
                }
            }
        }
        debug!(
            days = range.day_count(),
            excluded,
            candidates = candidates.len(),
            "Scanned slots"
        );

        candidates.sort_by(compare_slots);

        let mut seen_hours = HashSet::new();
        Ok(candidates
            .into_iter()
            .filter(|slot| seen_hours.insert(slot.utc_hour))
            .take(self.options.top_k)
            .collect())
    }

    fn resolve<'a>(&self, participants: &'a [Participant]) -> Result<Vec<ResolvedParticipant<'a>>> {
        let mut resolved = Vec::with_capacity(participants.len());
        for participant in participants {
            match timezone::parse_tz(&participant.timezone) {
                Ok(tz) => resolved.push(ResolvedParticipant { participant, tz }),
                Err(err) if self.options.skip_invalid_timezones => {
                    warn!(participant = %participant.name, error = %err, "Skipping participant");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(resolved)
    }

    fn is_excluded(
        &self,
        hour: u32,
        date: NaiveDate,
        resolved: &[ResolvedParticipant<'_>],
        constraints: &[ParsedConstraint],
    ) -> Result<bool> {
        for (r, constraint) in resolved.iter().zip(constraints) {
            if !constraint.is_recognized() {
                continue;
            }
            let local = timezone::local_datetime(hour, date, r.tz)?;
            if constraint.excludes(&local) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Most participants working first, then score, then closeness to the
/// majority's noon, then the earlier hour and date.
fn compare_slots(a: &SlotScore, b: &SlotScore) -> Ordering {
    b.count(HourCategory::Working)
        .cmp(&a.count(HourCategory::Working))
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.midday_distance.cmp(&b.midday_distance))
        .then_with(|| a.utc_hour.cmp(&b.utc_hour))
        .then_with(|| a.date.cmp(&b.date))
}

pub fn to_suggestion(slot: &SlotScore) -> Suggestion {
    Suggestion {
        start_time: slot.start_time(),
        reason: slot.rationale.clone(),
        impact: impact_for(&slot.participants),
    }
}
