use anyhow::Result;
use tracing::info;

use crate::classify::{AnalysisConfigOptions, ReferenceFilenameSynthesizer, RunClassifier};
use crate::cli::ClassifyArgs;
use crate::model::{ClassificationReport, GroupReportEntry, RunReportEntry};
use crate::pipeline::{PipelineOutput, classify_lines, reference_filenames};
use crate::source::{RunPathParser, SqliteRunSource};
use crate::util::{now_utc_string, read_input_lines, sha256_json, write_json_pretty};

use super::load_classifier_config;

pub fn run(args: ClassifyArgs) -> Result<()> {
    let config = load_classifier_config(&args.classifier)?;
    let options = args.analysis.to_options();
    let synthesizer = ReferenceFilenameSynthesizer::new(&config.filenames);
    synthesizer.cuts_tier(&options.cuts)?;

    let lines = read_input_lines(args.infile.as_deref())?;
    let parser = RunPathParser::new()?;
    let source = SqliteRunSource::open(&args.classifier.db_path, config.epochs)?;
    let classifier = RunClassifier::new(&config);

    let output = classify_lines(&lines, &parser, &source, &classifier);
    let filenames = reference_filenames(&output.groups, &synthesizer, &options)?;

    let input = args
        .infile
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());
    let report = build_report(output, filenames, options, input, sha256_json(&config)?);

    write_json_pretty(&args.report, &report)?;
    info!(
        path = %args.report.display(),
        runs = report.run_count,
        groups = report.group_count,
        "wrote classification report"
    );

    Ok(())
}

fn build_report(
    output: PipelineOutput,
    filenames: Vec<String>,
    analysis: AnalysisConfigOptions,
    input: String,
    config_sha256: String,
) -> ClassificationReport {
    let groups = output
        .groups
        .iter()
        .zip(filenames)
        .map(|((group_id, key, members), reference_filename)| GroupReportEntry {
            group_id,
            label: key.label(),
            reference_filename,
            run_ids: members.iter().map(|member| member.run_id.clone()).collect(),
        })
        .collect::<Vec<GroupReportEntry>>();

    let runs = output
        .runs
        .into_iter()
        .map(|run| {
            let classification = run.classification;
            RunReportEntry {
                run_id: run.entry.run_id,
                path: run.entry.path,
                epoch: classification.epoch,
                season: classification.season.season,
                season_confidence: classification.season.confidence,
                participation: classification.participation.participation,
                participation_source: classification.participation.source,
                participation_mismatch: classification.participation.mismatch,
                group_label: classification.key.label(),
                category: classification.category,
                metadata_defaulted: classification.metadata_defaulted,
            }
        })
        .collect::<Vec<RunReportEntry>>();

    ClassificationReport {
        manifest_version: 1,
        generated_at: now_utc_string(),
        input,
        config_sha256,
        analysis,
        run_count: runs.len(),
        group_count: groups.len(),
        runs,
        groups,
        skipped_lines: output.skipped,
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::{Connection, params};

    use super::*;
    use crate::cli::{AnalysisArgs, ClassifierArgs, OffsetArg, ReconcileArg};
    use crate::source::ensure_schema;

    #[test]
    fn classify_writes_report_with_mismatch_and_skipped_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("runs.sqlite");
        let input_path = dir.path().join("stage5.txt");
        let report_path = dir.path().join("reports").join("classification.json");

        let connection = Connection::open(&db_path).expect("open db");
        ensure_schema(&connection).expect("schema");
        connection
            .execute(
                "INSERT INTO tblRun_Info(run_id, data_start_time, config_mask, run_type) VALUES(?1, ?2, ?3, ?4)",
                params!["70123", "2013-06-10 05:00:00", 15, "observing"],
            )
            .expect("insert run");
        connection
            .execute(
                "INSERT INTO tblRun_Analysis_Comments(run_id, tel_cut_mask) VALUES('70123', '8')",
                [],
            )
            .expect("insert comment");
        drop(connection);

        std::fs::write(
            &input_path,
            "/data/70123.stage5.root\n/data/12.stage5.root\n/data/55555.stage5.root\n",
        )
        .expect("write input");

        let args = ClassifyArgs {
            infile: Some(input_path),
            classifier: ClassifierArgs {
                db_path,
                config: None,
                season_policy: None,
                season_fallback: false,
                legacy_mask_zero: false,
                reconcile: Some(ReconcileArg::MarkAmbiguous),
            },
            analysis: AnalysisArgs {
                cuts: "hard".to_string(),
                sim_model: "Oct2012".to_string(),
                sim_source: "GrISUDet".to_string(),
                offset: OffsetArg::HalfDegree,
                tel_multi: "t3".to_string(),
                no_lza: true,
            },
            report: report_path.clone(),
        };

        run(args).expect("classify");

        let raw = std::fs::read(&report_path).expect("read report");
        let report: serde_json::Value = serde_json::from_slice(&raw).expect("parse report");

        assert_eq!(report["run_count"], 2);
        assert_eq!(report["group_count"], 2);
        assert_eq!(report["skipped_lines"][0]["line_number"], 2);

        let mismatched = &report["runs"][0];
        assert_eq!(mismatched["participation"], "x234");
        assert_eq!(mismatched["participation_source"], "reconciled");
        assert_eq!(mismatched["participation_mismatch"]["dqm"], "-234");
        assert_eq!(mismatched["participation_mismatch"]["observer"], "1234");
        assert_eq!(mismatched["group_label"], "V6_PMTUpgrade_ATM22_x234_science");

        let defaulted = &report["runs"][1];
        assert_eq!(defaulted["metadata_defaulted"], true);
        assert_eq!(defaulted["epoch"], "V4_OldArray");
        assert_eq!(defaulted["season"], "ATM22");

        assert_eq!(
            report["groups"][0]["reference_filename"],
            "ea_Oct2012_V6_PMTUpgrade_ATM22_GrISUDet_vegasv250rc5_7sam_050off_s1200t3_std_MSW1.1_MSL1.4_ThetaSq0.01_x234_PMTfix.root"
        );
        assert_eq!(report["groups"][1]["run_ids"][0], "55555");
    }
}
