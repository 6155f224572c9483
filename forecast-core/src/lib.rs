//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - The forecast data model and its mapping from the OpenWeatherMap schema
//! - [`ForecastClient`], which queries `/data/2.5/forecast` over an injected transport
//! - Configuration & credentials handling
//! - Composition helpers that wire a client from configuration
//!
//! It is used by `forecast-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod transport;
pub mod wiring;

pub use client::{FORECAST_TIMESTAMPS, ForecastClient};
pub use config::Config;
pub use error::ForecastError;
pub use model::{ForecastEntry, ForecastResult, Measurements, WeatherCondition};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, TransportResponse};
pub use wiring::{TransportRegistry, client_from_config};

/// Re-exported so callers can build URLs for the transport seam without a direct `url` dependency.
pub use reqwest::Url;
