use axum::http::StatusCode;
use serde::Serialize;
use std::fmt;
use strum_macros::{Display, IntoStaticStr};

/// Where a "not found" error originated.
///
/// All three render identically; the source only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum NotFoundSource {
    /// A domain lookup came back empty
    Domain,
    /// No route matched the request
    Routing,
    /// The HTTP layer rejected the resource
    Http,
}

/// Classification tag carried by every [`ErrorEvent`](super::ErrorEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr)]
pub enum ErrorKind {
    AccessDenied,
    Authentication,
    NotFound(NotFoundSource),
    InvalidConfig,
    Validation,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(source) => write!(f, "NotFound({source})"),
            other => {
                let name: &'static str = other.into();
                f.write_str(name)
            }
        }
    }
}

/// Status, title and fallback message for one error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: StatusCode,
    pub title: &'static str,
    /// Used only when the error carries no message of its own.
    pub fallback: &'static str,
}

impl Classification {
    const fn new(status: StatusCode, title: &'static str, fallback: &'static str) -> Self {
        Self {
            status,
            title,
            fallback,
        }
    }

    /// The response policy, checked in priority order.
    pub const fn of(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::AccessDenied => Self::new(StatusCode::FORBIDDEN, "Forbidden", "Access error"),
            ErrorKind::Authentication => {
                Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", "Unauthorized")
            }
            ErrorKind::NotFound(
                NotFoundSource::Domain | NotFoundSource::Routing | NotFoundSource::Http,
            ) => Self::new(StatusCode::NOT_FOUND, "Not found", "Page not exists!"),
            ErrorKind::InvalidConfig => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Config error", "")
            }
            ErrorKind::Validation => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Unprocessable entity",
                "User input error",
            ),
            ErrorKind::Other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Error!", ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ErrorKind; 8] = [
        ErrorKind::AccessDenied,
        ErrorKind::Authentication,
        ErrorKind::NotFound(NotFoundSource::Domain),
        ErrorKind::NotFound(NotFoundSource::Routing),
        ErrorKind::NotFound(NotFoundSource::Http),
        ErrorKind::InvalidConfig,
        ErrorKind::Validation,
        ErrorKind::Other,
    ];

    #[test]
    fn test_status_codes_stay_in_allowed_set() {
        let allowed = [401, 403, 404, 422, 500];
        for kind in ALL_KINDS {
            let status = Classification::of(&kind).status.as_u16();
            assert!(allowed.contains(&status), "{kind} mapped to {status}");
        }
    }

    #[test]
    fn test_policy_table() {
        let forbidden = Classification::of(&ErrorKind::AccessDenied);
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.title, "Forbidden");
        assert_eq!(forbidden.fallback, "Access error");

        let unauthorized = Classification::of(&ErrorKind::Authentication);
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.title, "Unauthorized");

        let config = Classification::of(&ErrorKind::InvalidConfig);
        assert_eq!(config.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(config.title, "Config error");

        let validation = Classification::of(&ErrorKind::Validation);
        assert_eq!(validation.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(validation.title, "Unprocessable entity");
        assert_eq!(validation.fallback, "User input error");

        let other = Classification::of(&ErrorKind::Other);
        assert_eq!(other.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.title, "Error!");
    }

    #[test]
    fn test_not_found_sources_render_identically() {
        let domain = Classification::of(&ErrorKind::NotFound(NotFoundSource::Domain));
        assert_eq!(domain.status, StatusCode::NOT_FOUND);
        assert_eq!(domain.fallback, "Page not exists!");
        for source in [NotFoundSource::Routing, NotFoundSource::Http] {
            assert_eq!(Classification::of(&ErrorKind::NotFound(source)), domain);
        }
    }

    #[test]
    fn test_kind_display_names() {
        assert_eq!(ErrorKind::AccessDenied.to_string(), "AccessDenied");
        assert_eq!(
            ErrorKind::NotFound(NotFoundSource::Routing).to_string(),
            "NotFound(Routing)"
        );
        assert_eq!(ErrorKind::Other.to_string(), "Other");
    }
}
