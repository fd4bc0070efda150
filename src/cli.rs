use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::classify::{
    AnalysisConfigOptions, PointingOffset, ReconciliationPolicy, SeasonPolicy,
};

#[derive(Parser, Debug)]
#[command(
    name = "runlistgen",
    version,
    about = "Group stage5 runs by epoch, atmosphere and telescope participation into a stage6 runlist"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Generate(GenerateArgs),
    Classify(ClassifyArgs),
    InitDb(InitDbArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// File listing stage5 files (/path/to/<RUN ID>.stage5.root); stdin when omitted.
    pub infile: Option<PathBuf>,

    /// Output runlist; stdout when omitted.
    pub outfile: Option<PathBuf>,

    #[command(flatten)]
    pub classifier: ClassifierArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Write synthesized EA paths instead of group labels into the EA blocks.
    #[arg(long, default_value_t = false)]
    pub ea_match: bool,

    #[arg(long, default_value = "./")]
    pub ea_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    pub infile: Option<PathBuf>,

    #[command(flatten)]
    pub classifier: ClassifierArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[arg(long, default_value = "runlist_classification.json")]
    pub report: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct InitDbArgs {
    #[arg(long, default_value = "run_metadata.sqlite")]
    pub db_path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifierArgs {
    #[arg(long, default_value = "run_metadata.sqlite")]
    pub db_path: PathBuf,

    /// JSON file replacing the built-in classifier tables.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub season_policy: Option<SeasonPolicyArg>,

    /// Use the month-cutoff rule for season-years without a calibrated winter.
    #[arg(long, default_value_t = false)]
    pub season_fallback: bool,

    /// Treat config mask 0 as a full array, as older runlists did.
    #[arg(long, default_value_t = false)]
    pub legacy_mask_zero: bool,

    #[arg(long, value_enum)]
    pub reconcile: Option<ReconcileArg>,
}

#[derive(Args, Debug, Clone)]
pub struct AnalysisArgs {
    /// Cuts tier; any tier defined in the config is accepted.
    #[arg(long, default_value = "med")]
    pub cuts: String,

    #[arg(long, default_value = "Oct2012")]
    pub sim_model: String,

    #[arg(long, default_value = "GrISUDet")]
    pub sim_source: String,

    #[arg(long, value_enum, default_value_t = OffsetArg::Alloff)]
    pub offset: OffsetArg,

    #[arg(long, default_value = "t2")]
    pub tel_multi: String,

    /// Drop the large-zenith-angle tag from EA filenames.
    #[arg(long, default_value_t = false)]
    pub no_lza: bool,
}

impl AnalysisArgs {
    pub fn to_options(&self) -> AnalysisConfigOptions {
        AnalysisConfigOptions {
            cuts: self.cuts.clone(),
            sim_model: self.sim_model.clone(),
            sim_source: self.sim_source.clone(),
            offset: self.offset.into(),
            tel_multiplicity: self.tel_multi.clone(),
            large_zenith: !self.no_lza,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OffsetArg {
    #[value(name = "Alloff")]
    Alloff,
    #[value(name = "050off")]
    HalfDegree,
}

impl From<OffsetArg> for PointingOffset {
    fn from(value: OffsetArg) -> Self {
        match value {
            OffsetArg::Alloff => Self::AllOffsets,
            OffsetArg::HalfDegree => Self::HalfDegree,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SeasonPolicyArg {
    Calibrated,
    MonthCutoff,
}

impl From<SeasonPolicyArg> for SeasonPolicy {
    fn from(value: SeasonPolicyArg) -> Self {
        match value {
            SeasonPolicyArg::Calibrated => Self::Calibrated,
            SeasonPolicyArg::MonthCutoff => Self::MonthCutoff,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReconcileArg {
    MarkAmbiguous,
    PreferDqm,
    PreferObserver,
}

impl From<ReconcileArg> for ReconciliationPolicy {
    fn from(value: ReconcileArg) -> Self {
        match value {
            ReconcileArg::MarkAmbiguous => Self::MarkAmbiguous,
            ReconcileArg::PreferDqm => Self::PreferDqm,
            ReconcileArg::PreferObserver => Self::PreferObserver,
        }
    }
}
