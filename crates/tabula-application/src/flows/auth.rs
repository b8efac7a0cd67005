//! Sign-in, sign-out and route guarding.

use std::sync::Arc;

use tabula_core::auth::{
    LoginRequest, RegisterRequest, Route, RouteDecision, RouteGuard, StoredToken, TokenResponse,
    TokenStore, User, token_expired,
};
use tabula_core::cache::{Mutation, QueryKey};
use tabula_core::store::{AppStore, Session};
use tabula_core::{Result, TabulaError};
use tokio_util::sync::CancellationToken;

use crate::cancel::run_cancellable;
use crate::data_service::DataService;

pub struct AuthFlow {
    data: Arc<DataService>,
    tokens: Arc<dyn TokenStore>,
    store: Arc<AppStore>,
    guard: RouteGuard,
    cancel: CancellationToken,
}

impl AuthFlow {
    pub fn new(data: Arc<DataService>, tokens: Arc<dyn TokenStore>, store: Arc<AppStore>) -> Self {
        Self {
            data,
            guard: RouteGuard::new(tokens.clone()),
            tokens,
            store,
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let request = LoginRequest {
            email: required("Email", email)?,
            password: password_required(password)?,
        };

        let response = run_cancellable(&self.cancel, self.data.login(&request)).await?;
        tracing::info!("Signed in as {}", request.email);
        self.start_session(response).await
    }

    pub async fn register(&self, email: &str, password: &str, name: Option<&str>) -> Result<Session> {
        let request = RegisterRequest {
            email: required("Email", email)?,
            password: password_required(password)?,
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        };

        let response = run_cancellable(&self.cancel, self.data.register(&request)).await?;
        tracing::info!("Registered {}", request.email);
        self.start_session(response).await
    }

    /// Forgets the token, signs the store out and marks every cached query stale.
    pub async fn logout(&self) -> Result<()> {
        self.tokens.clear().await?;
        self.store.set_session(Session::SignedOut);
        self.data.invalidate(&Mutation::Logout).await;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Rebuilds the session from a token kept by a previous run.
    pub async fn restore(&self) -> Result<Session> {
        let Some(token) = self.tokens.load().await? else {
            self.store.set_session(Session::SignedOut);
            return Ok(Session::SignedOut);
        };

        if token_expired(&token.access_token, chrono::Utc::now().timestamp()) {
            tracing::info!("Stored token has expired");
            self.tokens.clear().await?;
            self.store.set_session(Session::SignedOut);
            return Ok(Session::SignedOut);
        }

        let session = match run_cancellable(&self.cancel, self.data.current_user()).await {
            Ok(user) => Session::SignedIn { user: Some(user) },
            Err(err) if err.is_unauthorized() => Session::SignedOut,
            Err(TabulaError::Cancelled) => return Err(TabulaError::Cancelled),
            Err(err) => {
                // Offline: keep the token and sign in without a profile.
                tracing::warn!("Could not load the current user: {}", err);
                Session::SignedIn { user: None }
            }
        };

        self.store.set_session(session.clone());
        Ok(session)
    }

    pub async fn resolve(&self, route: Route) -> RouteDecision {
        self.guard.resolve(route).await
    }

    async fn start_session(&self, response: TokenResponse) -> Result<Session> {
        self.tokens
            .save(&StoredToken::new(response.access_token))
            .await?;
        // Nothing cached for a previous account may be served to this one.
        self.data.cache().invalidate_prefix(&QueryKey::root()).await;

        let user: Option<User> = match response.user {
            Some(user) => Some(user),
            None => self.data.current_user().await.ok(),
        };

        let session = Session::SignedIn { user };
        self.store.set_session(session.clone());
        Ok(session)
    }
}

fn password_required(password: &str) -> Result<String> {
    if password.trim().is_empty() {
        return Err(TabulaError::validation("Password is required"));
    }
    Ok(password.to_string())
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TabulaError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

