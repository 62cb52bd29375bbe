use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    EmptyFormats,
    InvalidFrameRatio(f32),
    MissingActionText,
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::EmptyFormats => {
                write!(f, "barcode format list must not be empty")
            }
            ModelError::InvalidFrameRatio(ratio) => write!(
                f,
                "horizontal frame ratio must be a finite value above zero, got {ratio}"
            ),
            ModelError::MissingActionText => {
                write!(f, "text action enabled without action text")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
