use complaint_core::config::{ComplaintAppConfig, GeolocationConfig, PostgresInstanceConfig};

use crate::interface::http::validation::DEFAULT_MAX_CONTENT_LENGTH;

#[derive(Clone, Debug)]
pub struct ComplaintServiceConfig {
    pub postgres: Option<PostgresInstanceConfig>,
    pub geolocation: GeolocationConfig,
    pub max_content_length: usize,
    pub address: String,
    pub port: u16,
}

impl ComplaintServiceConfig {
    pub fn from_app_config(app: &ComplaintAppConfig) -> Self {
        let service = app.complaint_service();

        let postgres = service
            .metadata_store
            .as_deref()
            .and_then(|name| app.postgres_profile(name))
            .filter(|profile| !profile.url.trim().is_empty())
            .cloned();

        let max_content_length = service
            .max_content_length
            .filter(|len| *len > 0)
            .unwrap_or(DEFAULT_MAX_CONTENT_LENGTH);

        Self {
            postgres,
            geolocation: app.geolocation.clone(),
            max_content_length,
            address: app.server.address.clone(),
            port: app.server.port,
        }
    }

    pub fn postgres_url(&self) -> Option<&str> {
        self.postgres.as_ref().map(|cfg| cfg.url.as_str())
    }
}
