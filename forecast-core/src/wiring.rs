//! Composition helpers: turn a [`Config`] into a ready [`ForecastClient`].
//!
//! The binary builds one client at startup and hands clones of it to every
//! consumer, so a process shares a single transport and connection pool.

use std::{collections::BTreeMap, sync::Arc};

use anyhow::{Context, Result, anyhow};

use crate::{
    Config, ForecastClient,
    transport::{HttpTransport, ReqwestTransport},
};

/// Name under which the reqwest-backed transport is registered.
pub const DEFAULT_TRANSPORT: &str = "reqwest";

/// Named transport implementations, resolved once while wiring the application.
#[derive(Debug, Default, Clone)]
pub struct TransportRegistry {
    transports: BTreeMap<String, Arc<dyn HttpTransport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the reqwest transport configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let reqwest = ReqwestTransport::with_timeout(config.timeout())
            .context("Failed to build HTTP client")?;

        let mut registry = Self::new();
        registry.register(DEFAULT_TRANSPORT, Arc::new(reqwest));
        Ok(registry)
    }

    /// Register `transport` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, transport: Arc<dyn HttpTransport>) {
        self.transports.insert(name.into().to_lowercase(), transport);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn HttpTransport>> {
        self.transports.get(&name.to_lowercase()).cloned().ok_or_else(|| {
            let known: Vec<&str> = self.transports.keys().map(String::as_str).collect();
            anyhow!(
                "Unknown transport '{name}'. Registered transports: {}.",
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            )
        })
    }
}

/// Build a client over an explicit transport.
pub fn client_with_transport(
    config: &Config,
    transport: Arc<dyn HttpTransport>,
) -> Result<ForecastClient> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow!(
            "No OpenWeatherMap API key configured.\n\
             Hint: run `forecast configure` or set the OPENWEATHERMAP_API_KEY environment variable."
        )
    })?;

    let base_url = config.base_url()?;

    Ok(ForecastClient::new(transport, &base_url, api_key.to_owned()))
}

/// Build a client from config using the named transport out of `registry`.
pub fn client_from_registry(
    config: &Config,
    registry: &TransportRegistry,
    transport: &str,
) -> Result<ForecastClient> {
    client_with_transport(config, registry.resolve(transport)?)
}

/// Build a client from config over the default reqwest transport.
pub fn client_from_config(config: &Config) -> Result<ForecastClient> {
    let registry = TransportRegistry::from_config(config)?;
    client_from_registry(config, &registry, DEFAULT_TRANSPORT)
}
