use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::ClassifyError;

/// Atmospheric density model applied to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AtmosphereSeason {
    #[serde(rename = "ATM21")]
    Winter,
    #[serde(rename = "ATM22")]
    Summer,
}

impl AtmosphereSeason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Winter => "ATM21",
            Self::Summer => "ATM22",
        }
    }
}

impl fmt::Display for AtmosphereSeason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One calibrated winter, `[start, end)` at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinterInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WinterInterval {
    pub fn contains(&self, observed_at: NaiveDateTime) -> bool {
        let start = self.start.and_time(NaiveTime::MIN);
        let end = self.end.and_time(NaiveTime::MIN);
        observed_at >= start && observed_at < end
    }

    /// Observing season-year (July through June) this winter belongs to.
    pub fn season_year(&self) -> i32 {
        season_year_of(self.start.and_time(NaiveTime::MIN))
    }
}

pub fn validate_intervals(intervals: &[WinterInterval]) -> Result<(), ClassifyError> {
    for interval in intervals {
        if interval.end <= interval.start {
            return Err(ClassifyError::InvalidConfig(format!(
                "winter interval {} .. {} ends before it starts",
                interval.start, interval.end
            )));
        }
    }
    for pair in intervals.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(ClassifyError::InvalidConfig(format!(
                "winter intervals out of order or overlapping at {}",
                pair[1].start
            )));
        }
    }
    Ok(())
}

/// Fixed month boundaries: winter runs through `spring_cutoff` and starts
/// again at `fall_cutoff`. With `day_cutoff` set, the boundary months are
/// split on that day (winter up to and including it in spring, from it on in
/// fall).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCutoffPolicy {
    pub spring_cutoff: u32,
    pub fall_cutoff: u32,
    #[serde(default)]
    pub day_cutoff: Option<u32>,
}

impl Default for MonthCutoffPolicy {
    fn default() -> Self {
        Self {
            spring_cutoff: 3,
            fall_cutoff: 11,
            day_cutoff: Some(15),
        }
    }
}

impl MonthCutoffPolicy {
    pub fn classify(&self, observed_at: NaiveDateTime) -> AtmosphereSeason {
        let month = observed_at.month();
        let day = observed_at.day();

        let is_winter = match self.day_cutoff {
            None => month <= self.spring_cutoff || month >= self.fall_cutoff,
            Some(day_cutoff) => {
                month < self.spring_cutoff
                    || (month == self.spring_cutoff && day <= day_cutoff)
                    || month > self.fall_cutoff
                    || (month == self.fall_cutoff && day >= day_cutoff)
            }
        };

        if is_winter {
            AtmosphereSeason::Winter
        } else {
            AtmosphereSeason::Summer
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeasonPolicy {
    #[default]
    Calibrated,
    MonthCutoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonConfidence {
    Calibrated,
    MonthCutoff,
    /// No calibration covers the run; defaulted to summer.
    Extrapolated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonVerdict {
    pub season: AtmosphereSeason,
    pub confidence: SeasonConfidence,
}

pub struct SeasonClassifier<'a> {
    policy: SeasonPolicy,
    intervals: &'a [WinterInterval],
    month_cutoff: MonthCutoffPolicy,
    fallback_to_month_cutoff: bool,
}

impl<'a> SeasonClassifier<'a> {
    pub fn calibrated(intervals: &'a [WinterInterval]) -> Self {
        Self {
            policy: SeasonPolicy::Calibrated,
            intervals,
            month_cutoff: MonthCutoffPolicy::default(),
            fallback_to_month_cutoff: false,
        }
    }

    pub fn month_cutoff(month_cutoff: MonthCutoffPolicy) -> Self {
        Self {
            policy: SeasonPolicy::MonthCutoff,
            intervals: &[],
            month_cutoff,
            fallback_to_month_cutoff: false,
        }
    }

    /// Calibrated intervals first, the month rule for years without one.
    pub fn with_fallback(mut self, month_cutoff: MonthCutoffPolicy) -> Self {
        self.month_cutoff = month_cutoff;
        self.fallback_to_month_cutoff = true;
        self
    }

    pub fn classify(&self, observed_at: NaiveDateTime) -> SeasonVerdict {
        if self.policy == SeasonPolicy::MonthCutoff {
            return SeasonVerdict {
                season: self.month_cutoff.classify(observed_at),
                confidence: SeasonConfidence::MonthCutoff,
            };
        }

        if self
            .intervals
            .iter()
            .any(|interval| interval.contains(observed_at))
        {
            return SeasonVerdict {
                season: AtmosphereSeason::Winter,
                confidence: SeasonConfidence::Calibrated,
            };
        }

        let season_year = season_year_of(observed_at);
        if self
            .intervals
            .iter()
            .any(|interval| interval.season_year() == season_year)
        {
            return SeasonVerdict {
                season: AtmosphereSeason::Summer,
                confidence: SeasonConfidence::Calibrated,
            };
        }

        if self.fallback_to_month_cutoff {
            return SeasonVerdict {
                season: self.month_cutoff.classify(observed_at),
                confidence: SeasonConfidence::MonthCutoff,
            };
        }

        SeasonVerdict {
            season: AtmosphereSeason::Summer,
            confidence: SeasonConfidence::Extrapolated,
        }
    }
}

/// Season-years run July through June so that one winter stays in one year.
fn season_year_of(observed_at: NaiveDateTime) -> i32 {
    if observed_at.month() >= 7 {
        observed_at.year()
    } else {
        observed_at.year() - 1
    }
}
