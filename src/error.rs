//! Error types for the conversion pipeline.
//!
//! Fatal problems surface as [`ConvertError`]. Tag-functions report their own
//! failures through [`ExtractError`], which the tag mapper turns into a
//! `ConvertError` carrying the tag and function names.

use thiserror::Error;

/// A specialized Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors that stop a record from being converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("include argument should be one of ('required', 'all') or a list of tags, got `{0}`")]
    InvalidInclude(String),

    #[error("include argument contains unknown optional tag `{0}`")]
    UnknownIncludeTag(String),

    #[error("dialect should be one of ('bibtex', 'biblatex'), got `{0}`")]
    InvalidDialect(String),

    #[error("returned value from `{function}` for `{tag}` tag is invalid: {reason}")]
    InvalidTagValue {
        tag: String,
        function: String,
        reason: String,
    },

    #[error("hook `{hook}` returned no value for `{tag}` tag")]
    HookContractViolation { hook: String, tag: String },

    #[error("both author and editor (required) tags are treated empty")]
    MissingAuthorAndEditor,

    #[error("tag-function `{function}` for `{tag}` tag is not implemented")]
    NotImplemented { tag: String, function: String },

    #[error("cannot derive citation key: missing `{0}` tag")]
    MissingKeyTag(String),

    #[error("MARCXML error: {0}")]
    Xml(String),
}

/// Failure reported by a tag-function.
///
/// A merely missing field is not a failure, see [`crate::Extracted::Absent`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("not implemented")]
    NotImplemented,

    #[error("{0}")]
    Invalid(String),
}

impl ConvertError {
    /// Builds the error for a failed tag-function.
    pub(crate) fn from_extract(tag: &str, function: &str, err: ExtractError) -> Self {
        match err {
            ExtractError::NotImplemented => ConvertError::NotImplemented {
                tag: tag.to_string(),
                function: function.to_string(),
            },
            ExtractError::Invalid(reason) => ConvertError::InvalidTagValue {
                tag: tag.to_string(),
                function: function.to_string(),
                reason,
            },
        }
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::Error> for ConvertError {
    fn from(err: quick_xml::Error) -> Self {
        ConvertError::Xml(err.to_string())
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::events::attributes::AttrError> for ConvertError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ConvertError::Xml(err.to_string())
    }
}
