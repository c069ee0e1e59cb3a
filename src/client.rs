// Webtools gateway client

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    address::{self, AddressInput, AddressResult, ZipCodeResult},
    city_state::{self, CityStateResult},
    config::ClientConfig,
    error::{ClientError, Phase, TransportError, WebtoolsError},
    operations::Api,
    rate::{self, RateRequest, RateResult},
    response,
    transport::{HttpTransport, Transport},
    xml::{self, XmlElement},
};

// The four Webtools operations, so callers can stand in their own implementation
#[async_trait]
pub trait WebtoolsApi: Send + Sync + 'static {
    async fn verify(&self, address: AddressInput) -> Result<AddressResult, WebtoolsError>;

    async fn zip_code_lookup(&self, address: AddressInput) -> Result<ZipCodeResult, WebtoolsError>;

    async fn city_state_lookup(&self, zip: &str) -> Result<CityStateResult, WebtoolsError>;

    async fn pricing_rate_v4(&self, request: RateRequest) -> Result<RateResult, WebtoolsError>;
}

#[derive(Clone)]
pub struct WebtoolsClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for WebtoolsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebtoolsClient")
            .field("server", &self.config.server)
            .field("timeout", &self.config.timeout())
            .finish_non_exhaustive()
    }
}

impl WebtoolsClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends one request and returns the element the operation maps, with
    /// upstream errors already classified.
    async fn call(&self, api: Api, body: Vec<XmlElement>) -> Result<Value, WebtoolsError> {
        let envelope = XmlElement::new(api.request_root())
            .attr("USERID", self.config.user_id.as_str())
            .extend(body);
        let document = envelope
            .to_document()
            .map_err(|e| WebtoolsError::parse(api, Phase::Request, e.to_string()))?;

        let timeout = self.config.timeout();
        let query = [("API", api.name()), ("XML", document.as_str())];
        debug!(api = %api, server = %self.config.server, "calling webtools");
        let started = Instant::now();

        let body = match tokio::time::timeout(
            timeout,
            self.transport.get(&self.config.server, &query, timeout),
        )
        .await
        {
            Ok(Ok(body)) => body,
            Ok(Err(source)) => {
                warn!(api = %api, error = %source, "webtools request failed");
                return Err(WebtoolsError::transport(api, source));
            }
            Err(_) => {
                warn!(api = %api, timeout_ms = timeout.as_millis() as u64, "webtools request timed out");
                return Err(WebtoolsError::transport(api, TransportError::timeout(timeout)));
            }
        };
        debug!(
            api = %api,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = body.len(),
            "webtools call completed"
        );

        let parsed = xml::parse_document(&body, &self.config.parse_options)
            .map_err(|e| WebtoolsError::parse(api, Phase::Parse, e.to_string()))?;

        let path = self.config.response_path(api);
        response::extract(api, &path, &parsed).cloned()
    }
}

#[async_trait]
impl WebtoolsApi for WebtoolsClient {
    async fn verify(&self, address: AddressInput) -> Result<AddressResult, WebtoolsError> {
        address::validate_verify_input(&address)?;
        let element = self
            .call(Api::Verify, address::verify_request(&address))
            .await?;
        address::map_verify_result(&element)
    }

    async fn zip_code_lookup(&self, address: AddressInput) -> Result<ZipCodeResult, WebtoolsError> {
        address::validate_zip_lookup_input(&address)?;
        let element = self
            .call(Api::ZipCodeLookup, address::zip_lookup_request(&address))
            .await?;
        address::map_zip_lookup_result(&element)
    }

    async fn city_state_lookup(&self, zip: &str) -> Result<CityStateResult, WebtoolsError> {
        city_state::validate_zip(zip)?;
        let element = self
            .call(Api::CityStateLookup, city_state::city_state_request(zip))
            .await?;
        city_state::map_city_state_result(&element)
    }

    async fn pricing_rate_v4(&self, request: RateRequest) -> Result<RateResult, WebtoolsError> {
        rate::validate_rate_request(&request)?;
        let element = self.call(Api::RateV4, rate::rate_request(&request)).await?;
        rate::map_rate_result(&element)
    }
}
