use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::classify::{ReferenceFilenameSynthesizer, RunClassifier, RunGroups};
use crate::cli::GenerateArgs;
use crate::pipeline::{classify_lines, reference_filenames};
use crate::source::{RunEntry, RunPathParser, SqliteRunSource};
use crate::util::read_input_lines;

use super::load_classifier_config;

pub fn run(args: GenerateArgs) -> Result<()> {
    let config = load_classifier_config(&args.classifier)?;
    let options = args.analysis.to_options();
    let synthesizer = ReferenceFilenameSynthesizer::new(&config.filenames);
    synthesizer.cuts_tier(&options.cuts)?;

    let lines = read_input_lines(args.infile.as_deref())?;
    let parser = RunPathParser::new()?;
    let source = SqliteRunSource::open(&args.classifier.db_path, config.epochs)?;
    let classifier = RunClassifier::new(&config);

    let output = classify_lines(&lines, &parser, &source, &classifier);
    if output.groups.is_empty() {
        warn!("no runs were classified, runlist will be empty");
    }

    let ea_lines = if args.ea_match {
        reference_filenames(&output.groups, &synthesizer, &options)?
            .into_iter()
            .map(|filename| args.ea_dir.join(filename).display().to_string())
            .collect::<Vec<String>>()
    } else {
        output
            .groups
            .iter()
            .map(|(_, key, _)| key.label())
            .collect::<Vec<String>>()
    };

    match args.outfile.as_deref() {
        Some(path) => write_runlist_file(path, &output.groups, &ea_lines)?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            render_runlist(&mut handle, &output.groups, &ea_lines)
                .context("failed to write runlist to stdout")?;
            handle.flush().context("failed to flush stdout")?;
        }
    }

    info!(
        groups = output.groups.len(),
        runs = output.groups.member_count(),
        skipped = output.skipped.len(),
        ea_match = args.ea_match,
        "runlist generated"
    );

    Ok(())
}

fn write_runlist_file(path: &Path, groups: &RunGroups<RunEntry>, ea_lines: &[String]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create runlist: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    render_runlist(&mut writer, groups, ea_lines)
        .with_context(|| format!("failed to write runlist: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush runlist: {}", path.display()))?;

    info!(path = %path.display(), "wrote runlist");
    Ok(())
}

/// Writes the stage6 runlist: group 0 bare with its EA block, every later
/// group wrapped in RUNLIST/EA blocks plus an empty CONFIG block.
pub(crate) fn render_runlist<W: Write>(
    writer: &mut W,
    groups: &RunGroups<RunEntry>,
    ea_lines: &[String],
) -> io::Result<()> {
    for ((group_id, _, members), ea_line) in groups.iter().zip(ea_lines) {
        if group_id == 0 {
            for member in members {
                writeln!(writer, "{}", member.path)?;
            }
            writeln!(writer, "[EA ID: {group_id}]")?;
            writeln!(writer, "{ea_line}")?;
            writeln!(writer, "[/EA ID: {group_id}]")?;
            continue;
        }

        writeln!(writer, "[RUNLIST ID: {group_id}]")?;
        for member in members {
            writeln!(writer, "{}", member.path)?;
        }
        writeln!(writer, "[/RUNLIST ID: {group_id}]")?;
        writeln!(writer, "[EA ID: {group_id}]")?;
        writeln!(writer, "{ea_line}")?;
        writeln!(writer, "[/EA ID: {group_id}]")?;
        writeln!(writer, "[CONFIG ID: {group_id}]")?;
        writeln!(writer, "[/CONFIG ID: {group_id}]")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::{Connection, params};

    use super::*;
    use crate::classify::group::GroupKey;
    use crate::classify::{ArrayEpoch, AtmosphereSeason, RunCategory, TelescopeParticipation, group};
    use crate::cli::{AnalysisArgs, ClassifierArgs, OffsetArg};
    use crate::source::ensure_schema;

    fn entry(run_id: &str) -> RunEntry {
        RunEntry {
            run_id: run_id.to_string(),
            path: format!("/data/{run_id}.stage5.root"),
        }
    }

    fn key(epoch: ArrayEpoch, token: &str) -> GroupKey {
        GroupKey::build(
            epoch,
            AtmosphereSeason::Summer,
            TelescopeParticipation::parse_token(token).expect("token"),
            RunCategory::Science,
        )
    }

    #[test]
    fn render_runlist_writes_group_zero_without_wrappers() {
        let groups = group(vec![
            (entry("64080"), key(ArrayEpoch::PmtUpgrade, "1234")),
            (entry("45001"), key(ArrayEpoch::OldArray, "123-")),
            (entry("64081"), key(ArrayEpoch::PmtUpgrade, "1234")),
        ]);
        let ea_lines = vec!["ea_zero.root".to_string(), "ea_one.root".to_string()];

        let mut buffer = Vec::new();
        render_runlist(&mut buffer, &groups, &ea_lines).expect("render");
        let text = String::from_utf8(buffer).expect("utf8");

        let expected = "\
/data/64080.stage5.root
/data/64081.stage5.root
[EA ID: 0]
ea_zero.root
[/EA ID: 0]
[RUNLIST ID: 1]
/data/45001.stage5.root
[/RUNLIST ID: 1]
[EA ID: 1]
ea_one.root
[/EA ID: 1]
[CONFIG ID: 1]
[/CONFIG ID: 1]
";
        assert_eq!(text, expected);
    }

    #[test]
    fn generate_writes_matched_ea_paths_to_outfile() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("runs.sqlite");
        let input_path = dir.path().join("stage5.txt");
        let output_path = dir.path().join("runlist.txt");

        let connection = Connection::open(&db_path).expect("open db");
        ensure_schema(&connection).expect("schema");
        connection
            .execute(
                "INSERT INTO tblRun_Info(run_id, data_start_time, config_mask, run_type) VALUES(?1, ?2, ?3, ?4)",
                params!["66001", "2013-01-01 04:00:00", 15, "observing"],
            )
            .expect("insert run");
        drop(connection);

        std::fs::write(&input_path, "/data/66001.stage5.root\n").expect("write input");

        let args = GenerateArgs {
            infile: Some(input_path),
            outfile: Some(output_path.clone()),
            classifier: ClassifierArgs {
                db_path,
                config: None,
                season_policy: None,
                season_fallback: false,
                legacy_mask_zero: false,
                reconcile: None,
            },
            analysis: AnalysisArgs {
                cuts: "med".to_string(),
                sim_model: "Oct2012".to_string(),
                sim_source: "GrISUDet".to_string(),
                offset: OffsetArg::Alloff,
                tel_multi: "t2".to_string(),
                no_lza: false,
            },
            ea_match: true,
            ea_dir: dir.path().join("ea"),
        };

        run(args).expect("generate");

        let text = std::fs::read_to_string(&output_path).expect("read runlist");
        let lines = text.lines().collect::<Vec<&str>>();
        assert_eq!(lines[0], "/data/66001.stage5.root");
        assert_eq!(lines[1], "[EA ID: 0]");
        assert!(lines[2].ends_with(
            "ea_Oct2012_V6_PMTUpgrade_ATM21_GrISUDet_vegasv250rc5_7sam_Alloff_s700t2_std_MSW1.1_MSL1.3_MH7_ThetaSq0.01_LZA.root"
        ));
        assert_eq!(lines[3], "[/EA ID: 0]");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn generate_rejects_unknown_cuts_tier_before_reading_input() {
        let args = GenerateArgs {
            infile: Some("/nonexistent/stage5.txt".into()),
            outfile: None,
            classifier: ClassifierArgs {
                db_path: "/nonexistent/runs.sqlite".into(),
                config: None,
                season_policy: None,
                season_fallback: false,
                legacy_mask_zero: false,
                reconcile: None,
            },
            analysis: AnalysisArgs {
                cuts: "extreme".to_string(),
                sim_model: "Oct2012".to_string(),
                sim_source: "GrISUDet".to_string(),
                offset: OffsetArg::Alloff,
                tel_multi: "t2".to_string(),
                no_lza: false,
            },
            ea_match: false,
            ea_dir: "./".into(),
        };

        let err = run(args).expect_err("unknown tier must fail");
        assert!(err.to_string().contains("unknown cuts tier 'extreme'"));
    }
}
