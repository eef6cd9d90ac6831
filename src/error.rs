use thiserror::Error;

/// Errors raised while building a pacing pipeline.
///
/// Running the pipeline itself cannot fail; only construction and
/// configuration can.
#[derive(Debug, Error)]
pub enum PacingError {
    /// A [`FillerSet`](crate::FillerSet) needs at least one phrase.
    #[error("filler set must contain at least one phrase")]
    EmptyFillerSet,
    /// A lag entry could not be parsed as `position:milliseconds`.
    #[error("invalid lag entry `{0}`, expected `position:milliseconds`")]
    InvalidLagEntry(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PacingError>;
