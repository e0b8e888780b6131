use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::models::schedule::HourCategory;

/// Local-hour thresholds. Working is `[work_start, work_end)`, Waking is
/// `[wake_start, wake_end)` outside of Working, everything else is Sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationBoundaries {
    pub work_start: u32,
    pub work_end: u32,
    pub wake_start: u32,
    pub wake_end: u32,
}

impl Default for ClassificationBoundaries {
    fn default() -> Self {
        Self {
            work_start: 9,
            work_end: 18,
            wake_start: 7,
            wake_end: 22,
        }
    }
}

impl ClassificationBoundaries {
    pub fn validate(&self) -> Result<()> {
        let Self {
            work_start,
            work_end,
            wake_start,
            wake_end,
        } = *self;
        if work_start >= work_end || work_end > 24 {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "working hours {work_start}-{work_end} must satisfy 0 <= start < end <= 24"
            )));
        }
        if wake_start > work_start {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "waking start {wake_start} is after working start {work_start}"
            )));
        }
        if wake_end < work_end || wake_end > 24 {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "waking end {wake_end} must lie between working end {work_end} and 24"
            )));
        }
        Ok(())
    }
}

pub fn classify(local_hour: u32, boundaries: &ClassificationBoundaries) -> Result<HourCategory> {
    boundaries.validate()?;
    if local_hour > 23 {
        return Err(SchedulerError::InvalidHour(local_hour));
    }
    Ok(category_of(local_hour, boundaries))
}

fn category_of(local_hour: u32, b: &ClassificationBoundaries) -> HourCategory {
    if (b.work_start..b.work_end).contains(&local_hour) {
        HourCategory::Working
    } else if (b.wake_start..b.wake_end).contains(&local_hour) {
        HourCategory::Waking
    } else {
        HourCategory::Sleeping
    }
}

/// Classifier over boundaries that were validated once up front.
#[derive(Debug, Clone, Copy)]
pub struct HourClassifier {
    boundaries: ClassificationBoundaries,
}

impl HourClassifier {
    pub fn new(boundaries: ClassificationBoundaries) -> Result<Self> {
        boundaries.validate()?;
        Ok(Self { boundaries })
    }

    pub fn boundaries(&self) -> &ClassificationBoundaries {
        &self.boundaries
    }

    pub fn classify(&self, local_hour: u32) -> HourCategory {
        category_of(local_hour % 24, &self.boundaries)
    }
}

impl Default for HourClassifier {
    fn default() -> Self {
        Self {
            boundaries: ClassificationBoundaries::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_boundaries_partition_the_day() {
        let b = ClassificationBoundaries::default();
        let mut counts = [0usize; 3];
        for hour in 0..24 {
            match classify(hour, &b).unwrap() {
                HourCategory::Working => counts[0] += 1,
                HourCategory::Waking => counts[1] += 1,
                HourCategory::Sleeping => counts[2] += 1,
            }
        }
        assert_eq!(counts, [9, 6, 9]);
        assert_eq!(counts.iter().sum::<usize>(), 24);
    }

    #[test]
    fn default_edges() {
        let b = ClassificationBoundaries::default();
        assert_eq!(classify(6, &b).unwrap(), HourCategory::Sleeping);
        assert_eq!(classify(7, &b).unwrap(), HourCategory::Waking);
        assert_eq!(classify(9, &b).unwrap(), HourCategory::Working);
        assert_eq!(classify(17, &b).unwrap(), HourCategory::Working);
        assert_eq!(classify(18, &b).unwrap(), HourCategory::Waking);
        assert_eq!(classify(21, &b).unwrap(), HourCategory::Waking);
        assert_eq!(classify(22, &b).unwrap(), HourCategory::Sleeping);
    }

    #[test]
    fn rejects_misordered_boundaries() {
        let cases = [
            ClassificationBoundaries { work_start: 18, work_end: 9, wake_start: 7, wake_end: 22 },
            ClassificationBoundaries { work_start: 9, work_end: 18, wake_start: 10, wake_end: 22 },
            ClassificationBoundaries { work_start: 9, work_end: 18, wake_start: 7, wake_end: 17 },
            ClassificationBoundaries { work_start: 9, work_end: 25, wake_start: 7, wake_end: 25 },
        ];
        for b in cases {
            assert!(matches!(
                classify(10, &b),
                Err(SchedulerError::InvalidConfiguration(_))
            ));
            assert!(HourClassifier::new(b).is_err());
        }
    }

    #[test]
    fn full_day_work_leaves_nothing_else() {
        let b = ClassificationBoundaries { work_start: 0, work_end: 24, wake_start: 0, wake_end: 24 };
        let classifier = HourClassifier::new(b).unwrap();
        assert!((0..24).all(|h| classifier.classify(h) == HourCategory::Working));
    }

    #[test]
    fn rejects_out_of_range_hour() {
        let b = ClassificationBoundaries::default();
        assert_eq!(classify(24, &b), Err(SchedulerError::InvalidHour(24)));
    }
}
