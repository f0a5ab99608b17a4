//! Upstream request forwarding.
//!
//! One attempt per request over plaintext HTTP, bounded by the request's
//! deadline. The deadline covers connect, response head and body.

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::error::GatewayError;
use crate::http::request::OutboundRequest;
use crate::http::response::InboundResponseCapture;
use crate::resilience::UpstreamDeadline;

pub type UpstreamClient = Client<HttpConnector, Body>;

/// Issues outbound calls and captures their responses.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    max_response_bytes: usize,
}

impl Forwarder {
    pub fn new(max_response_bytes: usize) -> Self {
        // A header line without a colon is dropped; the rest of the reply is relayed.
        let client = Client::builder(TokioExecutor::new())
            .http1_ignore_invalid_headers_in_responses(true)
            .build(HttpConnector::new());
        Self {
            client,
            max_response_bytes,
        }
    }

    /// Send `request` to `service` and buffer the reply.
    pub async fn forward(
        &self,
        service: &str,
        request: OutboundRequest,
    ) -> Result<InboundResponseCapture, GatewayError> {
        let deadline = UpstreamDeadline::new(request.timeout);
        let target = request.target.clone();
        let request = request.into_http()?;

        tracing::debug!(service = %service, target = %target, "Forwarding request");

        deadline
            .run(service, async {
                let response = self.client.request(request).await.map_err(|e| {
                    GatewayError::UpstreamUnavailable {
                        service: service.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                InboundResponseCapture::capture(service, response, self.max_response_bytes).await
            })
            .await
    }
}
