mod classifier;
mod epoch;
mod error;
mod filename;
pub(crate) mod group;
mod participation;
mod season;

pub use classifier::{RunClassification, RunClassifier};
pub use epoch::{ArrayEpoch, EpochTransitions};
pub use error::ClassifyError;
pub use filename::{
    AnalysisConfigOptions, FilenameConventions, PointingOffset, ReferenceFilenameSynthesizer,
};
pub use group::{RunCategory, RunGroups, group};
pub use participation::{
    ConfigMaskTable, CutMaskReference, ParticipationMismatch, ParticipationSource,
    ReconciliationPolicy, TelescopeParticipation, normalize_cut_mask,
};
pub use season::{
    AtmosphereSeason, MonthCutoffPolicy, SeasonConfidence, SeasonPolicy, WinterInterval,
    validate_intervals,
};
