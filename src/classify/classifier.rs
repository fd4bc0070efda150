use crate::config::ClassifierConfig;
use crate::source::RunMetadataRecord;

use super::epoch::{ArrayEpoch, EpochClassifier};
use super::error::ClassifyError;
use super::group::{GroupKey, RunCategory};
use super::participation::{
    ParticipationSource, Resolution, TelescopeParticipation, TelescopeParticipationResolver,
};
use super::season::{
    AtmosphereSeason, SeasonClassifier, SeasonConfidence, SeasonPolicy, SeasonVerdict,
};

/// Outcome of classifying one run; the key is computed once here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunClassification {
    pub run_id: String,
    pub epoch: ArrayEpoch,
    pub season: SeasonVerdict,
    pub participation: Resolution,
    pub category: RunCategory,
    pub key: GroupKey,
    pub metadata_defaulted: bool,
}

pub struct RunClassifier<'a> {
    resolver: TelescopeParticipationResolver<'a>,
    seasons: SeasonClassifier<'a>,
}

impl<'a> RunClassifier<'a> {
    pub fn new(config: &'a ClassifierConfig) -> Self {
        let resolver = TelescopeParticipationResolver::new(
            &config.config_masks,
            &config.cut_mask_reference,
            config.reconciliation,
        );

        let seasons = match config.season_policy {
            SeasonPolicy::MonthCutoff => SeasonClassifier::month_cutoff(config.month_cutoff),
            SeasonPolicy::Calibrated if config.fallback_to_month_cutoff => {
                SeasonClassifier::calibrated(&config.winter_intervals)
                    .with_fallback(config.month_cutoff)
            }
            SeasonPolicy::Calibrated => SeasonClassifier::calibrated(&config.winter_intervals),
        };

        Self { resolver, seasons }
    }

    pub fn classify(&self, record: &RunMetadataRecord) -> Result<RunClassification, ClassifyError> {
        let participation = self
            .resolver
            .resolve(record.tel_cut_mask.as_deref(), record.config_mask)?;
        let epoch = EpochClassifier::classify(record.days_since_t1_move, record.days_since_upgrade);
        let season = self.seasons.classify(record.data_start_time);
        let category = RunCategory::from_run_type(&record.run_type);

        let key = GroupKey::build(
            epoch,
            season.season,
            participation.participation,
            category.clone(),
        );

        Ok(RunClassification {
            run_id: record.run_id.clone(),
            epoch,
            season,
            participation,
            category,
            key,
            metadata_defaulted: false,
        })
    }

    /// Classification used when no metadata could be retrieved for a run:
    /// no DQM report, full array, oldest epoch, summer atmosphere.
    pub fn defaulted(run_id: &str) -> RunClassification {
        let participation = Resolution {
            participation: TelescopeParticipation::ALL_PRESENT,
            source: ParticipationSource::Observer,
            mismatch: None,
        };
        let season = SeasonVerdict {
            season: AtmosphereSeason::Summer,
            confidence: SeasonConfidence::Extrapolated,
        };
        let key = GroupKey::build(
            ArrayEpoch::OldArray,
            season.season,
            participation.participation,
            RunCategory::Science,
        );

        RunClassification {
            run_id: run_id.to_string(),
            epoch: ArrayEpoch::OldArray,
            season,
            participation,
            category: RunCategory::Science,
            key,
            metadata_defaulted: true,
        }
    }
}
