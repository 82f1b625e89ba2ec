use std::sync::Arc;

use ferrodash_core::{
    run_dashboard_shared, BinanceConnector, DashboardConfig, DashboardError, DashboardSnapshot,
    EnvSecretStore, HttpClient, LayeredSecretStore, MapSecretStore, MarketConnector,
    ReqwestHttpClient, SecretStore, SyntheticHttpClient, TomlSecretStore, API_KEY_SECRET,
    API_SECRET_SECRET,
};
use tracing::info;

use crate::cli::ServerArgs;

/// Shared handles for route handlers. Each request runs its own pipeline.
pub struct AppState {
    pub config: DashboardConfig,
    pub secrets: Arc<dyn SecretStore>,
    pub connector: Arc<dyn MarketConnector>,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        secrets: Arc<dyn SecretStore>,
        connector: Arc<dyn MarketConnector>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            secrets,
            connector,
        })
    }

    /// Secrets file first, then the environment. `--mock` swaps the exchange
    /// transport for synthetic data and adds placeholder credentials as a last
    /// layer.
    pub fn from_args(args: &ServerArgs) -> Arc<Self> {
        let config = DashboardConfig::default().with_timeout_ms(args.timeout_ms);

        let mut secrets = LayeredSecretStore::new()
            .with_layer(TomlSecretStore::new(args.secrets.clone()))
            .with_layer(EnvSecretStore);

        let http_client: Arc<dyn HttpClient> = if args.mock {
            secrets = secrets.with_layer(
                MapSecretStore::new()
                    .with(API_KEY_SECRET, "mock-key")
                    .with(API_SECRET_SECRET, "mock-secret"),
            );
            Arc::new(SyntheticHttpClient::new())
        } else {
            Arc::new(ReqwestHttpClient::new())
        };

        let connector =
            BinanceConnector::new(http_client, config.base_url.clone(), config.timeout_ms);

        info!(
            secrets = %args.secrets.display(),
            mock = args.mock,
            base_url = %config.base_url,
            "dashboard state ready"
        );

        Self::new(config, Arc::new(secrets), Arc::new(connector))
    }

    pub async fn run(&self) -> Result<DashboardSnapshot, DashboardError> {
        run_dashboard_shared(
            &self.config,
            Arc::clone(&self.secrets),
            self.connector.as_ref(),
        )
        .await
    }
}
