use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::epoch::ArrayEpoch;
use super::error::ClassifyError;
use super::group::GroupKey;
use super::season::AtmosphereSeason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointingOffset {
    #[serde(rename = "Alloff")]
    AllOffsets,
    #[serde(rename = "050off")]
    HalfDegree,
}

impl PointingOffset {
    pub fn tag(self) -> &'static str {
        match self {
            Self::AllOffsets => "Alloff",
            Self::HalfDegree => "050off",
        }
    }
}

/// User-chosen analysis settings shared by every group of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisConfigOptions {
    pub cuts: String,
    pub sim_model: String,
    pub sim_source: String,
    pub offset: PointingOffset,
    pub tel_multiplicity: String,
    pub large_zenith: bool,
}

impl Default for AnalysisConfigOptions {
    fn default() -> Self {
        Self {
            cuts: "med".to_string(),
            sim_model: "Oct2012".to_string(),
            sim_source: "GrISUDet".to_string(),
            offset: PointingOffset::AllOffsets,
            tel_multiplicity: "t2".to_string(),
            large_zenith: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeThresholds {
    pub old_array: u32,
    pub t1_move: u32,
    pub pmt_upgrade: u32,
}

impl SizeThresholds {
    pub fn for_epoch(&self, epoch: ArrayEpoch) -> u32 {
        match epoch {
            ArrayEpoch::OldArray => self.old_array,
            ArrayEpoch::T1Move => self.t1_move,
            ArrayEpoch::PmtUpgrade => self.pmt_upgrade,
        }
    }
}

/// Cut values of one tier. `max_height` is not applied by every tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutsTierSpec {
    pub size: SizeThresholds,
    pub msw: f64,
    pub msl: f64,
    #[serde(default)]
    pub max_height: Option<f64>,
    pub theta_sq: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFix {
    pub epoch: ArrayEpoch,
    pub season: AtmosphereSeason,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilenameConventions {
    pub prefix: String,
    pub tool_version: String,
    pub sample_count: String,
    pub method: String,
    pub large_zenith_tag: String,
    pub extension: String,
    pub cuts_tiers: BTreeMap<String, CutsTierSpec>,
    #[serde(default)]
    pub structural_fixes: Vec<StructuralFix>,
}

impl Default for FilenameConventions {
    fn default() -> Self {
        let thresholds = |old_array, t1_move, pmt_upgrade| SizeThresholds {
            old_array,
            t1_move,
            pmt_upgrade,
        };

        let mut cuts_tiers = BTreeMap::new();
        cuts_tiers.insert(
            "soft".to_string(),
            CutsTierSpec {
                size: thresholds(200, 200, 400),
                msw: 1.1,
                msl: 1.3,
                max_height: Some(7.0),
                theta_sq: 0.03,
            },
        );
        cuts_tiers.insert(
            "med".to_string(),
            CutsTierSpec {
                size: thresholds(400, 400, 700),
                msw: 1.1,
                msl: 1.3,
                max_height: Some(7.0),
                theta_sq: 0.01,
            },
        );
        cuts_tiers.insert(
            "hard".to_string(),
            CutsTierSpec {
                size: thresholds(1000, 1000, 1200),
                msw: 1.1,
                msl: 1.4,
                max_height: None,
                theta_sq: 0.01,
            },
        );
        cuts_tiers.insert(
            "loose".to_string(),
            CutsTierSpec {
                size: thresholds(200, 200, 400),
                msw: 1.3,
                msl: 1.4,
                max_height: None,
                theta_sq: 0.03,
            },
        );

        Self {
            prefix: "ea".to_string(),
            tool_version: "vegasv250rc5".to_string(),
            sample_count: "7sam".to_string(),
            method: "std".to_string(),
            large_zenith_tag: "LZA".to_string(),
            extension: ".root".to_string(),
            cuts_tiers,
            structural_fixes: vec![
                StructuralFix {
                    epoch: ArrayEpoch::T1Move,
                    season: AtmosphereSeason::Winter,
                    tag: "T1fix".to_string(),
                },
                StructuralFix {
                    epoch: ArrayEpoch::PmtUpgrade,
                    season: AtmosphereSeason::Summer,
                    tag: "PMTfix".to_string(),
                },
            ],
        }
    }
}

pub struct ReferenceFilenameSynthesizer<'a> {
    conventions: &'a FilenameConventions,
}

impl<'a> ReferenceFilenameSynthesizer<'a> {
    pub fn new(conventions: &'a FilenameConventions) -> Self {
        Self { conventions }
    }

    pub fn cuts_tier(&self, cuts: &str) -> Result<&'a CutsTierSpec, ClassifyError> {
        self.conventions
            .cuts_tiers
            .get(cuts.trim())
            .ok_or_else(|| ClassifyError::UnknownCutsTier(cuts.to_string()))
    }

    fn structural_fix(&self, epoch: ArrayEpoch, season: AtmosphereSeason) -> Option<&str> {
        self.conventions
            .structural_fixes
            .iter()
            .find(|fix| fix.epoch == epoch && fix.season == season)
            .map(|fix| fix.tag.as_str())
    }

    /// Builds the effective-area filename expected for a group, e.g.
    /// `ea_Oct2012_V6_PMTUpgrade_ATM21_GrISUDet_vegasv250rc5_7sam_Alloff_s700t2_std_MSW1.1_MSL1.3_MH7_ThetaSq0.01_LZA.root`.
    pub fn synthesize(
        &self,
        key: &GroupKey,
        options: &AnalysisConfigOptions,
    ) -> Result<String, ClassifyError> {
        let tier = self.cuts_tier(&options.cuts)?;
        let conventions = self.conventions;

        let mut name = String::with_capacity(160);
        name.push_str(&conventions.prefix);
        for tag in [
            options.sim_model.as_str(),
            key.epoch.label(),
            key.season.label(),
            options.sim_source.as_str(),
            conventions.tool_version.as_str(),
            conventions.sample_count.as_str(),
            options.offset.tag(),
        ] {
            push_tag(&mut name, tag);
        }

        let _ = write!(
            name,
            "_s{}{}",
            tier.size.for_epoch(key.epoch),
            options.tel_multiplicity.trim_start_matches('_')
        );
        push_tag(&mut name, &conventions.method);

        let _ = write!(name, "_MSW{}_MSL{}", tier.msw, tier.msl);
        if let Some(max_height) = tier.max_height {
            let _ = write!(name, "_MH{max_height}");
        }
        let _ = write!(name, "_ThetaSq{}", tier.theta_sq);

        if !key.participation.is_all_present() {
            push_tag(&mut name, &key.participation.token());
        }
        if options.large_zenith {
            push_tag(&mut name, &conventions.large_zenith_tag);
        }
        if let Some(fix) = self.structural_fix(key.epoch, key.season) {
            push_tag(&mut name, fix);
        }

        name.push_str(&conventions.extension);
        Ok(name)
    }
}

fn push_tag(name: &mut String, tag: &str) {
    let tag = tag.trim_matches('_');
    if tag.is_empty() {
        return;
    }
    name.push('_');
    name.push_str(tag);
}
