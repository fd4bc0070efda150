use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{
    AnalysisConfigOptions, ClassifyError, ReferenceFilenameSynthesizer, RunClassification,
    RunClassifier, RunGroups, SeasonConfidence, group,
};
use crate::source::{RunEntry, RunMetadataSource, RunPathParser};

#[derive(Debug, Clone)]
pub struct ClassifiedRun {
    pub entry: RunEntry,
    pub classification: RunClassification,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedLine {
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub runs: Vec<ClassifiedRun>,
    pub groups: RunGroups<RunEntry>,
    pub skipped: Vec<SkippedLine>,
}

/// Classifies every listed run and groups them. Bad lines are skipped and
/// lookup failures fall back to default metadata; neither stops the batch.
pub fn classify_lines(
    lines: &[String],
    parser: &RunPathParser,
    source: &dyn RunMetadataSource,
    classifier: &RunClassifier<'_>,
) -> PipelineOutput {
    let mut runs = Vec::with_capacity(lines.len());
    let mut skipped = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let line_number = index + 1;
        let entry = match parser.parse_line(line) {
            None => continue,
            Some(Ok(entry)) => entry,
            Some(Err(err)) => {
                warn!(line_number, line = %line.trim(), error = %err, "skipping input line");
                skipped.push(SkippedLine {
                    line_number,
                    line: line.trim().to_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        info!(run_id = %entry.run_id, "classifying run");
        let classification = classify_entry(&entry, source, classifier);
        report_degraded(&classification);

        runs.push(ClassifiedRun {
            entry,
            classification,
        });
    }

    let groups = group(
        runs.iter()
            .map(|run| (run.entry.clone(), run.classification.key.clone())),
    );

    info!(
        runs = runs.len(),
        groups = groups.len(),
        skipped = skipped.len(),
        "grouping complete"
    );

    PipelineOutput {
        runs,
        groups,
        skipped,
    }
}

fn classify_entry(
    entry: &RunEntry,
    source: &dyn RunMetadataSource,
    classifier: &RunClassifier<'_>,
) -> RunClassification {
    let record = match source.lookup(&entry.run_id) {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!(run_id = %entry.run_id, "no run metadata found, using defaults");
            return RunClassifier::defaulted(&entry.run_id);
        }
        Err(err) => {
            warn!(run_id = %entry.run_id, error = %format!("{err:#}"), "run metadata lookup failed, using defaults");
            return RunClassifier::defaulted(&entry.run_id);
        }
    };

    match classifier.classify(&record) {
        Ok(classification) => classification,
        Err(err) => {
            warn!(run_id = %entry.run_id, error = %err, "run metadata unusable, using defaults");
            RunClassifier::defaulted(&entry.run_id)
        }
    }
}

fn report_degraded(classification: &RunClassification) {
    if let Some(mismatch) = classification.participation.mismatch {
        warn!(
            run_id = %classification.run_id,
            dqm = %mismatch.dqm,
            observer = %mismatch.observer,
            outcome = %classification.participation.participation,
            policy = mismatch.policy.as_str(),
            authority = mismatch.policy.authority(),
            "DQM and observer reported telescope participation do not match"
        );
    }

    if !classification.metadata_defaulted
        && classification.season.confidence == SeasonConfidence::Extrapolated
    {
        warn!(
            run_id = %classification.run_id,
            season = %classification.season.season,
            "no calibrated winter interval for this season-year, defaulting to summer"
        );
    }
}

/// One reference filename per group, in group order.
pub fn reference_filenames(
    groups: &RunGroups<RunEntry>,
    synthesizer: &ReferenceFilenameSynthesizer<'_>,
    options: &AnalysisConfigOptions,
) -> Result<Vec<String>, ClassifyError> {
    groups
        .iter()
        .map(|(_, key, _)| synthesizer.synthesize(key, options))
        .collect()
}
