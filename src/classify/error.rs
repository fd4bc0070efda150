use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("unknown cuts tier '{0}' (no cut table configured for it)")]
    UnknownCutsTier(String),

    #[error("config mask {0} is outside 0..=15")]
    ConfigMaskOutOfRange(u8),

    #[error("cannot extract a run id from '{0}' (expected .../<5-char run id>.stage5.root)")]
    MalformedRunPath(String),

    #[error("invalid participation token '{0}'")]
    InvalidParticipationToken(String),

    #[error("invalid classifier configuration: {0}")]
    InvalidConfig(String),
}
