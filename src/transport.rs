// HTTP transport seam
//
// The client only needs "GET this URL with these query parameters within this
// timeout"; everything else (pooling, TLS, proxies) belongs to reqwest.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::error::TransportError;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Bytes, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(timeout)
    } else {
        TransportError::from(err)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Bytes, TransportError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| classify(e, timeout))?;
        trace!(status = status.as_u16(), bytes = body.len(), "webtools response received");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

// In-process transport for tests and benchmarks
pub mod mock_transport {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRequest {
        pub url: String,
        pub api: String,
        pub xml: String,
    }

    pub struct MockTransport {
        responses: Mutex<HashMap<String, String>>,
        requests: Mutex<Vec<RecordedRequest>>,
        fail_next_requests: AtomicUsize,
        delay_ms: AtomicUsize,
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                fail_next_requests: AtomicUsize::new(0),
                delay_ms: AtomicUsize::new(0),
            }
        }

        /// Serves `body` for every request whose `API` parameter is `api`.
        pub async fn respond_with(&self, api: &str, body: &str) {
            let mut responses = self.responses.lock().await;
            responses.insert(api.to_string(), body.to_string());
        }

        pub fn fail_next_requests(&self, count: usize) {
            self.fail_next_requests.store(count, Ordering::SeqCst);
        }

        pub fn set_delay(&self, delay_ms: usize) {
            self.delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        pub async fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().await.clone()
        }
    }

    fn param<'a>(query: &[(&'a str, &'a str)], key: &str) -> &'a str {
        query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or_default()
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn get(
            &self,
            url: &str,
            query: &[(&str, &str)],
            _timeout: Duration,
        ) -> Result<Bytes, TransportError> {
            let api = param(query, "API").to_string();
            self.requests.lock().await.push(RecordedRequest {
                url: url.to_string(),
                api: api.clone(),
                xml: param(query, "XML").to_string(),
            });

            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            let fail_count = self.fail_next_requests.load(Ordering::SeqCst);
            if fail_count > 0 {
                self.fail_next_requests
                    .store(fail_count - 1, Ordering::SeqCst);
                return Err(TransportError::Other("connection refused".to_string()));
            }

            let responses = self.responses.lock().await;
            match responses.get(&api) {
                Some(body) => Ok(Bytes::from(body.clone())),
                None => Err(TransportError::Status {
                    status: 404,
                    body: format!("no canned response for API={api}"),
                }),
            }
        }
    }
}
