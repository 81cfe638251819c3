pub mod commands;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod services;

use config::Config;
use error::AppResult;
use services::{api::ApiClient, booking::BookingFlow, cache::QueryCache, session::SessionStore};

pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub booking: BookingFlow<ApiClient>,
}

impl AppState {
    /// Wire the session, cache and API client together. The booking flow
    /// shares the same session and cache as `api`.
    pub async fn new(config: Config) -> AppResult<Self> {
        let session = SessionStore::load(config.session.file.clone()).await;
        let cache = QueryCache::new(std::time::Duration::from_secs(config.cache.ttl_seconds));
        let api = ApiClient::new(&config, session, cache)?;
        let booking = BookingFlow::new(api.clone(), &config);

        Ok(Self {
            config,
            api,
            booking,
        })
    }

    pub fn lang(&self) -> &str {
        &self.config.lang
    }
}
