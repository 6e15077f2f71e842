use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::constants::AUTH_ROUTE;
use crate::services::identity::IdentityError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    /// Rejection from the identity provider, shown to the user verbatim.
    #[error("{0}")]
    Identity(String),

    #[error("You've already sent a request to this player")]
    DuplicateRequest,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You can only change tables you added")]
    Forbidden,

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    /// Failure already written to the log; the client gets no detail.
    #[error("Request failed")]
    Logged,
}

/// Toast-style payload every screen knows how to show.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: None,
            redirect: None,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: Some("destructive"),
            ..Self::success(title, description)
        }
    }

    pub fn redirect_to(mut self, route: &'static str) -> Self {
        self.redirect = Some(route);
        self
    }
}

impl AppError {
    /// Logs `err` and hides it from the response. Used by the screens that
    /// only report failures to the diagnostic log.
    pub fn logged(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{context}");
        AppError::Logged
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Identity(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateRequest => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Internal(_) | AppError::Logged => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(msg) => AppError::Identity(msg),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let notice = match &self {
            AppError::Logged => return status.into_response(),
            AppError::Unauthorized => {
                Notice::destructive("Error", self.to_string()).redirect_to(AUTH_ROUTE)
            }
            AppError::DuplicateRequest => Notice::destructive("Already sent", self.to_string()),
            AppError::Database(err) => {
                tracing::error!(error = %err, "store call failed");
                Notice::destructive("Error", self.to_string())
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                Notice::destructive("Error", self.to_string())
            }
            _ => Notice::destructive("Error", self.to_string()),
        };

        (status, Json(notice)).into_response()
    }
}

/// True for the store's duplicate-key rejection.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
