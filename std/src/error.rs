use thiserror::Error;
use verdict_flow::{BuildError, ConfigError};

/// Errors raised while configuring or assembling a standard application.
#[derive(Error, Debug)]
pub enum PolicyConfigError {
    #[error("invalid policy file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("`{field}` must be greater than zero")]
    Zero { field: &'static str },
    #[error("voting_duration + term_duration overflows")]
    WindowOverflow,
    #[error("start_round {start} is after end_round {end}")]
    RoundRange { start: u64, end: u64 },
    #[error("`{field}` is not valid hex of {len} bytes")]
    Hex { field: &'static str, len: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Build(#[from] BuildError),
}
