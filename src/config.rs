use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::{
    ClassifyError, ConfigMaskTable, CutMaskReference, EpochTransitions, FilenameConventions,
    MonthCutoffPolicy, ReconciliationPolicy, SeasonPolicy, WinterInterval, validate_intervals,
};

/// Every table the classifier consults. The built-in default reproduces the
/// standard VEGAS 2.5 conventions; a JSON file with the same shape replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub epochs: EpochTransitions,
    pub config_masks: ConfigMaskTable,
    pub cut_mask_reference: CutMaskReference,
    #[serde(default)]
    pub reconciliation: ReconciliationPolicy,
    #[serde(default)]
    pub season_policy: SeasonPolicy,
    pub winter_intervals: Vec<WinterInterval>,
    pub month_cutoff: MonthCutoffPolicy,
    #[serde(default)]
    pub fallback_to_month_cutoff: bool,
    pub filenames: FilenameConventions,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            epochs: EpochTransitions::default(),
            config_masks: ConfigMaskTable::standard(),
            cut_mask_reference: CutMaskReference::standard(),
            reconciliation: ReconciliationPolicy::default(),
            season_policy: SeasonPolicy::default(),
            winter_intervals: default_winter_intervals(),
            month_cutoff: MonthCutoffPolicy::default(),
            fallback_to_month_cutoff: false,
            filenames: FilenameConventions::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw =
            fs::read(path).with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClassifyError> {
        self.config_masks.validate()?;
        validate_intervals(&self.winter_intervals)?;

        if self.epochs.pmt_upgrade <= self.epochs.t1_move {
            return Err(ClassifyError::InvalidConfig(
                "PMT upgrade date must come after the T1 move date".to_string(),
            ));
        }
        let cutoff = &self.month_cutoff;
        if !(1..=12).contains(&cutoff.spring_cutoff) || !(1..=12).contains(&cutoff.fall_cutoff) {
            return Err(ClassifyError::InvalidConfig(
                "month cutoffs must be within 1..=12".to_string(),
            ));
        }
        if self.filenames.cuts_tiers.is_empty() {
            return Err(ClassifyError::InvalidConfig(
                "at least one cuts tier must be configured".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_winter_intervals() -> Vec<WinterInterval> {
    [
        ((2007, 11, 8), (2008, 4, 2)),
        ((2008, 11, 12), (2009, 3, 29)),
        ((2009, 11, 2), (2010, 4, 6)),
        ((2010, 11, 15), (2011, 3, 24)),
        ((2011, 11, 5), (2012, 4, 10)),
        ((2012, 11, 20), (2013, 3, 30)),
        ((2013, 11, 10), (2014, 4, 3)),
        ((2014, 11, 17), (2015, 3, 26)),
        ((2015, 11, 3), (2016, 4, 8)),
    ]
    .into_iter()
    .filter_map(|(start, end)| {
        Some(WinterInterval {
            start: NaiveDate::from_ymd_opt(start.0, start.1, start.2)?,
            end: NaiveDate::from_ymd_opt(end.0, end.1, end.2)?,
        })
    })
    .collect()
}
