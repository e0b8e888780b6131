use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Inclusive range of calendar days. Never ends before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDateRange")]
pub struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = SchedulerError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.start_date, raw.end_date)
    }
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self> {
        if start_date > end_date {
            return Err(SchedulerError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start_date: day,
            end_date: day,
        }
    }

    /// `today` through one week later.
    pub fn week_from(today: NaiveDate) -> Self {
        Self {
            start_date: today,
            end_date: today + Duration::days(7),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn day_count(&self) -> usize {
        ((self.end_date - self.start_date).num_days() + 1).max(0) as usize
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |day| *day <= self.end_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HourCategory {
    Working,
    Waking,
    Sleeping,
}

impl HourCategory {
    pub fn weight(self) -> f64 {
        match self {
            HourCategory::Working => 1.0,
            HourCategory::Waking => 0.5,
            HourCategory::Sleeping => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HourCategory::Working => "working",
            HourCategory::Waking => "awake",
            HourCategory::Sleeping => "sleeping",
        }
    }

    pub fn symbol(self) -> char {
        match self {
            HourCategory::Working => 'W',
            HourCategory::Waking => 'a',
            HourCategory::Sleeping => '.',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantHourInfo {
    pub participant_id: String,
    pub participant_name: String,
    pub local_hour: u32,
    pub category: HourCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotScore {
    pub utc_hour: u32,
    pub date: Option<NaiveDate>,
    pub participants: Vec<ParticipantHourInfo>,
    pub score: f64,
    pub rationale: String,
    /// Minutes between this hour and local noon of the largest group of
    /// participants sharing a UTC offset.
    pub midday_distance: u32,
}

impl SlotScore {
    pub fn count(&self, category: HourCategory) -> usize {
        self.participants
            .iter()
            .filter(|p| p.category == category)
            .count()
    }

    pub fn names_in(&self, category: HourCategory) -> Vec<&str> {
        self.participants
            .iter()
            .filter(|p| p.category == category)
            .map(|p| p.participant_name.as_str())
            .collect()
    }

    pub fn start_time(&self) -> String {
        match self.date {
            Some(date) => format!("{} {:02}:00 UTC", date.format("%Y-%m-%d"), self.utc_hour),
            None => format!("{:02}:00 UTC", self.utc_hour),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub start_time: String,
    pub reason: String,
    pub impact: String,
}

/// A start time read from a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTime {
    At(DateTime<Utc>),
    TimeOfDay(NaiveTime),
}

impl StartTime {
    pub fn hour(&self) -> u32 {
        match self {
            StartTime::At(at) => at.hour(),
            StartTime::TimeOfDay(time) => time.hour(),
        }
    }
}

/// Accepts `YYYY-MM-DD HH:mm UTC`, RFC 3339, `YYYY-MM-DD HH:mm` and a bare
/// `HH:mm` (optionally followed by `UTC`).
pub fn parse_start_time(raw: &str) -> Result<StartTime> {
    let trimmed = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(StartTime::At(at.with_timezone(&Utc)));
    }

    let without_zone = trimmed
        .strip_suffix("UTC")
        .or_else(|| trimmed.strip_suffix('Z'))
        .unwrap_or(trimmed)
        .trim();

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(without_zone, format) {
            return Ok(StartTime::At(naive.and_utc()));
        }
    }
    for format in ["%H:%M", "%H:%M:%S"] {
        if let Ok(time) = NaiveTime::parse_from_str(without_zone, format) {
            return Ok(StartTime::TimeOfDay(time));
        }
    }
    Err(SchedulerError::UnparseableStartTime(raw.to_string()))
}

/// UTC hour a presentation layer selects when a suggestion is applied.
pub fn apply_suggestion(suggestion: &Suggestion) -> Result<u32> {
    parse_start_time(&suggestion.start_time).map(|start| start.hour())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        let err = DateRange::new(day(2026, 3, 2), day(2026, 3, 1)).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidDateRange { .. }));
    }

    #[test]
    fn deserializing_a_reversed_range_fails() {
        let ok: DateRange =
            serde_json::from_str(r#"{"startDate":"2026-03-01","endDate":"2026-03-02"}"#).unwrap();
        assert_eq!(ok.start_date(), day(2026, 3, 1));
        assert_eq!(ok.end_date(), day(2026, 3, 2));
        assert!(
            serde_json::from_str::<DateRange>(r#"{"startDate":"2026-03-02","endDate":"2026-03-01"}"#)
                .is_err()
        );
    }

    #[test]
    fn date_range_days_are_inclusive() {
        let range = DateRange::new(day(2026, 2, 27), day(2026, 3, 2)).unwrap();
        let days: Vec<NaiveDate> = range.days().collect();
        assert_eq!(range.day_count(), 4);
        assert_eq!(days, vec![day(2026, 2, 27), day(2026, 2, 28), day(2026, 3, 1), day(2026, 3, 2)]);
    }

    #[test]
    fn week_from_spans_eight_days() {
        let range = DateRange::week_from(day(2026, 10, 19));
        assert_eq!(range.end_date(), day(2026, 10, 26));
        assert_eq!(range.day_count(), 8);
    }

    #[test]
    fn apply_reads_full_and_bare_times() {
        let full = Suggestion {
            start_time: "2026-03-04 15:00 UTC".to_string(),
            reason: String::new(),
            impact: String::new(),
        };
        assert_eq!(apply_suggestion(&full), Ok(15));

        let bare = Suggestion {
            start_time: "09:30 UTC".to_string(),
            ..full.clone()
        };
        assert_eq!(apply_suggestion(&bare), Ok(9));

        let rfc = Suggestion {
            start_time: "2026-03-04T10:00:00+02:00".to_string(),
            ..full.clone()
        };
        assert_eq!(apply_suggestion(&rfc), Ok(8));
    }

    #[test]
    fn apply_rejects_prose() {
        let vague = Suggestion {
            start_time: "sometime tomorrow".to_string(),
            reason: String::new(),
            impact: String::new(),
        };
        assert!(matches!(
            apply_suggestion(&vague),
            Err(SchedulerError::UnparseableStartTime(_))
        ));
    }

    #[test]
    fn start_time_formats_with_and_without_date() {
        let mut slot = SlotScore {
            utc_hour: 7,
            date: Some(day(2026, 1, 5)),
            participants: Vec::new(),
            score: 0.0,
            rationale: String::new(),
            midday_distance: 0,
        };
        assert_eq!(slot.start_time(), "2026-01-05 07:00 UTC");
        slot.date = None;
        assert_eq!(slot.start_time(), "07:00 UTC");
    }
}
