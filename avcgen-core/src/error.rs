//! Error types for the avcgen library.
//!
//! Encoding is all-or-nothing per stream: a truncated Annex-B stream is not a
//! meaningful artifact, so every error here aborts the whole run.

use thiserror::Error;

/// Main error type for the avcgen library.
#[derive(Error, Debug)]
pub enum Error {
    /// Bitstream writing/reading errors.
    #[error("Bitstream error: {0}")]
    Bitstream(#[from] BitstreamError),

    /// Stream description errors.
    #[error("Description error: {0}")]
    Description(#[from] DescriptionError),

    /// I/O errors from the byte sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Out-of-domain numeric input to a primitive codec.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unsupported feature (e.g. CABAC slice data).
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// An error attributed to a specific NAL unit of the input sequence.
    #[error("NAL {index}: {source}")]
    Nal {
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

/// Bitstream writing/reading errors.
#[derive(Error, Debug)]
pub enum BitstreamError {
    /// Unexpected end of bitstream (read side).
    #[error("Unexpected end of bitstream")]
    UnexpectedEnd,

    /// Exp-Golomb decoding error.
    #[error("Exp-Golomb decoding error: value too large")]
    ExpGolombOverflow,

    /// Generic bitstream error message.
    #[error("{0}")]
    Other(String),
}

/// Stream description errors.
///
/// Descriptions are hand-authored, so these carry enough context (the NAL
/// index is attached by the encoder loop, the field name here) to locate the
/// offending record.
#[derive(Error, Debug)]
pub enum DescriptionError {
    /// The declared `nal_unit_type` has no handler.
    #[error("unsupported nal_unit_type {value}")]
    UnsupportedNalType { value: u8 },

    /// A field required for the given context is absent.
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A NAL record could not be decoded into its typed payload.
    #[error("malformed description: {message}")]
    Malformed { message: String },

    /// The description stream itself could not be parsed.
    #[error("invalid stream description: {message}")]
    Parse { message: String },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create a missing-field description error.
    pub fn missing_field(field: &'static str) -> Self {
        Error::Description(DescriptionError::MissingField { field })
    }

    /// Attribute this error to the NAL unit at `index`.
    #[must_use]
    pub fn at_nal(self, index: usize) -> Self {
        match self {
            Error::Nal { .. } => self,
            other => Error::Nal {
                index,
                source: Box::new(other),
            },
        }
    }
}
