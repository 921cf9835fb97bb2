//! Error types. Internally we use `anyhow` (`Res<T>`) and add context as errors bubble up. At the
//! public boundary the error is classified with an `ErrorType` so that callers can distinguish,
//! for example, a missing configuration from an unreachable Google sheet.

use crate::model::Category;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies errors that are returned from public functions.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration or data directory is missing or invalid.
    Config,
    /// The remote store is missing the identifiers or keys it needs. No I/O was attempted.
    NotConfigured,
    /// The remote store could not be reached or returned something we could not understand.
    RemoteUnavailable,
    /// The remote store was reached but refused the request.
    RemoteRejected,
    /// A local SQLite operation failed.
    Database,
    /// The request made by the user was invalid, e.g. an unknown record id.
    Request,
    /// Something unexpected.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type. It wraps an `anyhow::Error`, classifies it with an `ErrorType` and, when
/// the failure happened while working on one record category, names that category.
pub struct Error {
    error_type: ErrorType,
    category: Option<Category>,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            category: None,
            inner: inner.into(),
        }
    }

    /// Creates an error from a message.
    pub(crate) fn msg(error_type: ErrorType, message: impl Display) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    /// Tags the error with the category that was being processed when it occurred.
    pub(crate) fn in_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    /// The record category that was being processed, if any.
    pub fn category(&self) -> Option<Category> {
        self.category
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.category {
            Some(category) => write!(f, "[{}] {category}: {:#}", self.error_type, self.inner),
            None => write!(f, "[{}] {:#}", self.error_type, self.inner),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("error_type", &self.error_type)
            .field("category", &self.category)
            .field("inner", &self.inner)
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::new(ErrorType::Internal, e)
    }
}

/// Converts an internal result into the public `Result`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
