pub mod classify;
pub mod generate;
pub mod init_db;

use anyhow::Result;
use tracing::info;

use crate::cli::ClassifierArgs;
use crate::config::ClassifierConfig;

fn load_classifier_config(args: &ClassifierArgs) -> Result<ClassifierConfig> {
    let mut config = ClassifierConfig::load(args.config.as_deref())?;

    if let Some(policy) = args.season_policy {
        config.season_policy = policy.into();
    }
    if args.season_fallback {
        config.fallback_to_month_cutoff = true;
    }
    if args.legacy_mask_zero {
        config.config_masks = config.config_masks.with_zero_as_full_array();
    }
    if let Some(policy) = args.reconcile {
        config.reconciliation = policy.into();
    }

    info!(
        config = %args.config.as_ref().map(|path| path.display().to_string()).unwrap_or_else(|| "built-in".to_string()),
        season_policy = ?config.season_policy,
        season_fallback = config.fallback_to_month_cutoff,
        reconciliation = config.reconciliation.as_str(),
        legacy_mask_zero = args.legacy_mask_zero,
        "loaded classifier config"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use crate::classify::TelescopeParticipation;

    use super::*;

    #[test]
    fn legacy_mask_zero_keeps_custom_table_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("classifier.json");

        let mut raw = serde_json::to_value(ClassifierConfig::default()).expect("serialize");
        raw["config_masks"][7] = serde_json::Value::from("12--");
        std::fs::write(&config_path, serde_json::to_vec_pretty(&raw).expect("encode"))
            .expect("write config");

        let args = ClassifierArgs {
            db_path: dir.path().join("runs.sqlite"),
            config: Some(config_path),
            season_policy: None,
            season_fallback: false,
            legacy_mask_zero: true,
            reconcile: None,
        };

        let config = load_classifier_config(&args).expect("load config");
        assert_eq!(
            config.config_masks.lookup(0).expect("mask 0"),
            TelescopeParticipation::ALL_PRESENT
        );
        assert_eq!(config.config_masks.lookup(7).expect("mask 7").token(), "12--");
    }
}
