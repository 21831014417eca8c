//! HTTP delivery seam.

use crate::webhook::DeliveryError;
use crate::webhook::signing::SIGNATURE_HEADER;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::trace;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs a signed JSON body and reports the response status.
pub trait Transport {
    /// # Errors
    ///
    /// Returns `DeliveryError::Transport` when no response arrives.
    fn post(&self, url: &str, body: &[u8], signature: Option<&str>) -> Result<u16, DeliveryError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, url: &str, body: &[u8], signature: Option<&str>) -> Result<u16, DeliveryError> {
        (**self).post(url, body, signature)
    }
}

/// Blocking `reqwest` transport sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns `DeliveryError::Transport` if the TLS backend cannot initialize.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, body: &[u8], signature: Option<&str>) -> Result<u16, DeliveryError> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        trace!(url, status, "Webhook response");
        Ok(status)
    }
}
