//! Error types for subnet-lists.

use thiserror::Error;

/// Error type for subnet-lists operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Download error
    #[error("download error: {0}")]
    Download(#[from] reqwest::Error),

    /// Feed answered with a non-success status
    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid prefix literal
    #[error("invalid prefix: {0}")]
    InvalidPrefix(#[from] PrefixParseError),

    /// Range arithmetic left the 32-bit address space.
    ///
    /// Never produced by valid input; it means the decomposition is broken.
    #[error("range boundary out of address space: [{start}, {end}]")]
    OverflowGuard { start: u64, end: u64 },
}

/// Result type alias for subnet-lists operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error for a single line that is not a usable prefix.
///
/// Recoverable: the caller logs it and moves on to the next line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefixParseError {
    /// Blank input
    #[error("empty prefix literal")]
    Empty,

    /// Address part is not an IP address
    #[error("invalid address in prefix literal: {0}")]
    InvalidAddress(String),

    /// Length part is not a number
    #[error("invalid prefix length in literal: {0}")]
    InvalidLength(String),

    /// Length exceeds the address width
    #[error("prefix length out of range (max {max}): {literal}")]
    LengthOutOfRange { literal: String, max: u8 },
}

impl PrefixParseError {
    /// The literal that failed to parse.
    pub fn literal(&self) -> &str {
        match self {
            PrefixParseError::Empty => "",
            PrefixParseError::InvalidAddress(s) | PrefixParseError::InvalidLength(s) => s,
            PrefixParseError::LengthOutOfRange { literal, .. } => literal,
        }
    }
}
