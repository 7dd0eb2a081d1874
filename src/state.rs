use sqlx::SqlitePool;

use crate::{assistant::AssistantClient, config::Config, mailer::Mailer, payments::PaymentClient};

/// Shared per-process dependencies, owned here and cloned into each worker.
/// No ambient singletons: everything a handler touches hangs off this struct.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub mailer: Mailer,
    pub payments: PaymentClient,
    pub assistant: AssistantClient,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let http = reqwest::Client::new();
        Self {
            mailer: Mailer::new(http.clone(), &config),
            payments: PaymentClient::new(http.clone(), config.stripe_secret_key.clone()),
            assistant: AssistantClient::new(http, config.gemini_api_key.clone()),
            db,
            config,
        }
    }
}
