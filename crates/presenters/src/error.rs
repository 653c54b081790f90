use authoring_core::{PipelineError, ServiceCallError};
use thiserror::Error;

use crate::view::Notice;

/// Failure of a presenter operation. By the time one is returned the view has
/// already been told, so callers usually only log it.
#[derive(Debug, Error)]
pub enum PresenterError {
    #[error("nothing is being edited")]
    NotEditing,
    #[error("{what} cannot be changed in read-only mode")]
    ReadOnly { what: &'static str },
    #[error("{0}")]
    Rejected(String),
    #[error("{title}: {source}")]
    Service {
        title: String,
        #[source]
        source: ServiceCallError,
    },
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("invalid preview address: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type PresenterResult<T> = Result<T, PresenterError>;

impl PresenterError {
    pub fn service(title: impl Into<String>, source: ServiceCallError) -> Self {
        Self::Service {
            title: title.into(),
            source,
        }
    }
}

/// Error-details notice for a failed service call.
pub(crate) fn service_notice(title: &str, message: &str, err: &ServiceCallError) -> Notice {
    let api_error = err.to_api_error();
    let details = match (api_error.details, err) {
        (Some(details), _) => Some(details),
        (None, ServiceCallError::Rejected { .. }) => None,
        (None, _) => Some(err.to_string()),
    };
    Notice::ErrorDetails {
        title: title.to_string(),
        message: if message.is_empty() {
            api_error.message
        } else {
            message.to_string()
        },
        details,
        stack_trace: api_error.stack_trace,
    }
}
