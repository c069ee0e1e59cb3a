// Client library for the USPS Webtools XML API

pub mod address;
pub mod city_state;
pub mod client;
pub mod config;
pub mod error;
pub mod operations;
pub mod rate;
pub mod response;
pub mod transport;
pub mod xml;

// Re-export key types for convenience
pub use address::{AddressInput, AddressResult, ZipCodeResult};
pub use city_state::CityStateResult;
pub use client::{WebtoolsApi, WebtoolsClient};
pub use config::ClientConfig;
pub use error::{ClientError, ErrorContext, Phase, TransportError, WebtoolsError, XmlError};
pub use operations::{Api, ResponsePath};
pub use rate::{Postage, RateRequest, RateResult};
pub use transport::{HttpTransport, Transport};
pub use xml::{normalize_scalar, ParseOptions};
