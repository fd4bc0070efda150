use serde::Serialize;

use crate::classify::{
    AnalysisConfigOptions, ArrayEpoch, AtmosphereSeason, ParticipationMismatch,
    ParticipationSource, RunCategory, SeasonConfidence, TelescopeParticipation,
};
use crate::pipeline::SkippedLine;

#[derive(Debug, Clone, Serialize)]
pub struct RunReportEntry {
    pub run_id: String,
    pub path: String,
    pub epoch: ArrayEpoch,
    pub season: AtmosphereSeason,
    pub season_confidence: SeasonConfidence,
    pub participation: TelescopeParticipation,
    pub participation_source: ParticipationSource,
    pub participation_mismatch: Option<ParticipationMismatch>,
    pub category: RunCategory,
    pub group_label: String,
    pub metadata_defaulted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupReportEntry {
    pub group_id: usize,
    pub label: String,
    pub reference_filename: String,
    pub run_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub manifest_version: u32,
    pub generated_at: String,
    pub input: String,
    pub config_sha256: String,
    pub analysis: AnalysisConfigOptions,
    pub run_count: usize,
    pub group_count: usize,
    pub runs: Vec<RunReportEntry>,
    pub groups: Vec<GroupReportEntry>,
    pub skipped_lines: Vec<SkippedLine>,
}
