use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Hardware era of the array, ordered by install date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArrayEpoch {
    #[serde(rename = "V4_OldArray")]
    OldArray,
    #[serde(rename = "V5_T1Move")]
    T1Move,
    #[serde(rename = "V6_PMTUpgrade")]
    PmtUpgrade,
}

impl ArrayEpoch {
    pub fn label(self) -> &'static str {
        match self {
            Self::OldArray => "V4_OldArray",
            Self::T1Move => "V5_T1Move",
            Self::PmtUpgrade => "V6_PMTUpgrade",
        }
    }
}

impl fmt::Display for ArrayEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochTransitions {
    pub t1_move: NaiveDate,
    pub pmt_upgrade: NaiveDate,
}

const T1_MOVE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2009, 9, 1) {
    Some(date) => date,
    None => panic!("invalid T1 move date"),
};

const PMT_UPGRADE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2012, 9, 1) {
    Some(date) => date,
    None => panic!("invalid PMT upgrade date"),
};

impl Default for EpochTransitions {
    fn default() -> Self {
        Self {
            t1_move: T1_MOVE_DATE,
            pmt_upgrade: PMT_UPGRADE_DATE,
        }
    }
}

impl EpochTransitions {
    /// Whole-day differences `(run date - T1 move, run date - upgrade)`,
    /// matching SQL `DATEDIFF(data_start_time, date)`.
    pub fn days_since(&self, observed_at: NaiveDateTime) -> (i64, i64) {
        let date = observed_at.date();
        (
            (date - self.t1_move).num_days(),
            (date - self.pmt_upgrade).num_days(),
        )
    }
}

pub struct EpochClassifier;

impl EpochClassifier {
    /// Transition dates are inclusive: a run on the day of a transition
    /// belongs to the new epoch.
    pub fn classify(days_since_t1_move: i64, days_since_upgrade: i64) -> ArrayEpoch {
        if days_since_upgrade >= 0 {
            ArrayEpoch::PmtUpgrade
        } else if days_since_t1_move >= 0 {
            ArrayEpoch::T1Move
        } else {
            ArrayEpoch::OldArray
        }
    }
}
