pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod extractors;
pub mod logging;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::external::simulated::SimulatedPriceProvider;
use crate::services::auth_service::AuthService;
use crate::services::ledger_service::LedgerService;
use crate::services::valuation_service::InvestmentService;
use crate::state::AppState;
use crate::store::JsonFileStore;

/// Opens (or seeds) the record store and wires every service around it.
pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let seed = if config.seed_demo_data {
        Some(seed::demo_database(&config.demo_password).context("failed to build demo data")?)
    } else {
        None
    };

    let store = match &config.data_path {
        Some(path) => JsonFileStore::open(path.clone(), seed)
            .with_context(|| format!("failed to open record store at {}", path.display()))?,
        None => {
            info!("💾 Using in-memory record store");
            JsonFileStore::in_memory(seed.unwrap_or_default())
        }
    };
    if let Some(path) = store.path() {
        info!("💾 Record store at {}", path.display());
    }
    let store = Arc::new(store);

    Ok(AppState {
        ledger: LedgerService::new(store.clone()),
        investments: InvestmentService::new(store.clone()),
        auth: AuthService::new(
            store,
            config.jwt_secret.as_bytes(),
            Duration::hours(config.jwt_ttl_hours),
        ),
        price_provider: Arc::new(SimulatedPriceProvider::new(config.price_max_swing)),
    })
}
