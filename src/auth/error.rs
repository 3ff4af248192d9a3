use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Which strategy slot a failure came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    Auth,
    Role,
    Remember,
    Forget,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auth => "auth",
            Self::Role => "role",
            Self::Remember => "remember",
            Self::Forget => "forget",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The caller is not authorized; send them to `location`.
    #[error("redirect to {location} ({status})")]
    Redirect {
        location: String,
        status: StatusCode,
    },
    /// A role request named a strategy that was never registered.
    #[error("unknown role strategy: {0}")]
    UnknownRole(String),
    /// A strategy failed while talking to its backend.
    #[error("{kind} strategy failed")]
    Strategy {
        kind: StrategyKind,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn redirect(location: &str, status: StatusCode) -> Self {
        Self::Redirect {
            location: location.to_string(),
            status,
        }
    }

    pub(crate) fn strategy(kind: StrategyKind) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Self::Strategy { kind, source }
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect { location, status } => match HeaderValue::from_str(&location) {
                Ok(location) => (status, [(LOCATION, location)]).into_response(),
                Err(err) => {
                    error!("Invalid redirect location {location}: {err}");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            },
            Self::UnknownRole(name) => {
                error!("Unknown role strategy: {name}");
                StatusCode::FORBIDDEN.into_response()
            }
            Self::Strategy { kind, source } => {
                error!("{kind} strategy failed: {source:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn redirect_response_sets_location() {
        let response = Error::redirect("/user/unauthorized", StatusCode::SEE_OTHER).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/user/unauthorized"
        );
    }

    #[test]
    fn strategy_failure_is_internal_error() {
        let err = Error::strategy(StrategyKind::Remember)(anyhow!("database is down"));
        assert!(!err.is_redirect());
        assert_eq!(err.to_string(), "remember strategy failed");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unknown_role_is_forbidden() {
        let err = Error::UnknownRole("admin".to_string());
        assert_eq!(err.to_string(), "unknown role strategy: admin");
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}
