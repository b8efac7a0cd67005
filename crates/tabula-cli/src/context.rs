//! Wires config, token storage, the HTTP client and the data service together.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tabula_application::{AuthFlow, DataService};
use tabula_core::auth::{Route, RouteDecision, TokenStore};
use tabula_core::config::ClientConfig;
use tabula_core::store::AppStore;
use tabula_infrastructure::{ConfigService, FileTokenStore, TabulaPaths};
use tabula_interaction::HttpApiClient;

pub struct AppContext {
    pub config: ClientConfig,
    pub data: Arc<DataService>,
    pub auth: AuthFlow,
}

impl AppContext {
    pub fn build(paths: &TabulaPaths, api_url: Option<String>) -> Result<Self> {
        let mut config = ConfigService::new(paths)
            .load()
            .with_context(|| format!("Failed to load {}", paths.config_file().display()))?;
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            config.api.base_url = url;
        }
        tracing::debug!("Using backend {}", config.api.base_url);

        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(paths.token_file()));
        let client = HttpApiClient::new(&config.api, tokens.clone())?;
        let data = Arc::new(DataService::new(Arc::new(client), config.cache.clone()));
        let store = Arc::new(AppStore::default());
        let auth = AuthFlow::new(data.clone(), tokens, store);

        Ok(Self { config, data, auth })
    }

    /// Fails with a sign-in hint when `route` needs a session the token store cannot provide.
    pub async fn require(&self, route: Route) -> Result<()> {
        match self.auth.resolve(route).await {
            RouteDecision::Allow(_) => Ok(()),
            RouteDecision::Redirect(to) => {
                tracing::info!("{} redirected to {}", route, to);
                bail!("Not signed in. Run `tabula login --email <EMAIL>` first.")
            }
        }
    }
}
