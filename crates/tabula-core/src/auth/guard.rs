//! Route protection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::token_store::TokenStore;
use crate::error::TabulaError;

/// Screens of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Dashboard,
    QuickAnalysis,
    Projects,
    Project(i64),
    FileAnalysis { project_id: i64, file_id: i64 },
    FileChat { project_id: i64, file_id: i64 },
    Compare(i64),
    Merge(i64),
}

impl Route {
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Home | Self::Login | Self::Register)
    }

    pub fn path(self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::QuickAnalysis => "/analyze".to_string(),
            Self::Projects => "/projects".to_string(),
            Self::Project(id) => format!("/projects/{}", id),
            Self::FileAnalysis {
                project_id,
                file_id,
            } => format!("/projects/{}/files/{}", project_id, file_id),
            Self::FileChat {
                project_id,
                file_id,
            } => format!("/projects/{}/files/{}/chat", project_id, file_id),
            Self::Compare(id) => format!("/projects/{}/compare", id),
            Self::Merge(id) => format!("/projects/{}/merge", id),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = TabulaError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let id = |raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| TabulaError::validation(format!("Unknown route: {}", path)))
        };

        let route = match segments.as_slice() {
            [] => Self::Home,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["dashboard"] => Self::Dashboard,
            ["analyze"] => Self::QuickAnalysis,
            ["projects"] => Self::Projects,
            ["projects", p] => Self::Project(id(*p)?),
            ["projects", p, "compare"] => Self::Compare(id(*p)?),
            ["projects", p, "merge"] => Self::Merge(id(*p)?),
            ["projects", p, "files", f] => Self::FileAnalysis {
                project_id: id(*p)?,
                file_id: id(*f)?,
            },
            ["projects", p, "files", f, "chat"] => Self::FileChat {
                project_id: id(*p)?,
                file_id: id(*f)?,
            },
            _ => return Err(TabulaError::validation(format!("Unknown route: {}", path))),
        };
        Ok(route)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow(Route),
    Redirect(Route),
}

/// Whether `token` is a JWT whose `exp` claim is already in the past.
///
/// Tokens that are not JWTs, or carry no readable `exp`, are not considered
/// expired; the backend stays the authority for those.
pub fn token_expired(token: &str, now_unix: i64) -> bool {
    let Some(payload) = token.split('.').nth(1) else {
        return false;
    };

    let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) else {
        return false;
    };

    serde_json::from_slice::<serde_json::Value>(&bytes)
        .ok()
        .and_then(|claims| claims.get("exp").and_then(|exp| exp.as_i64()))
        .is_some_and(|exp| exp <= now_unix)
}

/// Sends unauthenticated visitors of protected routes to the login screen.
#[derive(Clone)]
pub struct RouteGuard {
    token_store: Arc<dyn TokenStore>,
}

impl RouteGuard {
    pub fn new(token_store: Arc<dyn TokenStore>) -> Self {
        Self { token_store }
    }

    pub async fn resolve(&self, route: Route) -> RouteDecision {
        if !route.is_protected() {
            return RouteDecision::Allow(route);
        }

        let token = match self.token_store.load().await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!("Could not read stored token, treating as signed out: {}", err);
                None
            }
        };

        match token {
            Some(token) if !token_expired(&token.access_token, chrono::Utc::now().timestamp()) => {
                RouteDecision::Allow(route)
            }
            Some(_) => {
                tracing::info!("Stored token expired, redirecting {} to /login", route);
                RouteDecision::Redirect(Route::Login)
            }
            None => RouteDecision::Redirect(Route::Login),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_expired_jwt() {
        assert!(token_expired(&jwt_with_exp(1_000), 2_000));
        assert!(!token_expired(&jwt_with_exp(3_000), 2_000));
    }

    #[test]
    fn test_opaque_token_not_expired() {
        assert!(!token_expired("abc123", 2_000));
        assert!(!token_expired("a.%%%.c", 2_000));
    }

    #[test]
    fn test_route_round_trip_through_path() {
        for route in [
            Route::Home,
            Route::Login,
            Route::Projects,
            Route::Project(4),
            Route::FileAnalysis {
                project_id: 4,
                file_id: 9,
            },
            Route::Merge(2),
        ] {
            assert_eq!(route.path().parse::<Route>().unwrap(), route);
        }
    }

    #[test]
    fn test_unknown_route() {
        assert!("/projects/abc".parse::<Route>().is_err());
        assert!("/settings".parse::<Route>().is_err());
    }

    #[test]
    fn test_public_routes() {
        assert!(!Route::Login.is_protected());
        assert!(!Route::Register.is_protected());
        assert!(Route::Dashboard.is_protected());
        assert!(Route::Compare(1).is_protected());
    }
}
