//! Built-in handler that forwards events to an upstream process.
//!
//! # Responsibilities
//! - POST the normalized request as JSON to the configured URL
//! - Decode the upstream reply into a handler response
//! - Map transport and protocol failures to handler errors
//!
//! # Design Decisions
//! - The upstream replies with `{statusCode, headers, body}` on success
//! - A reply carrying `errorMessage` is an application error
//! - Non-2xx upstream status is an application error
//! - The only timeout is the upstream client's, never the dispatcher's
//! - A request whose client has already gone away is not forwarded

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::HandlerConfig;
use crate::handler::{Completion, Handler, HandlerError, HandlerResponse, NormalizedRequest, Outcome};

/// Errors talking to the upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("forward handler requires a forward_url")]
    MissingUrl,

    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("invalid upstream reply: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Upstream reply: either an error report or a handler response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply {
    #[serde(rename_all = "camelCase")]
    Error {
        error_message: String,
        #[serde(default)]
        error_type: Option<String>,
    },
    Response(HandlerResponse),
}

/// Forwards each normalized request to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ForwardHandler {
    client: reqwest::Client,
    url: String,
}

impl ForwardHandler {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ForwardError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &HandlerConfig) -> Result<Self, ForwardError> {
        let url = config.forward_url.clone().ok_or(ForwardError::MissingUrl)?;
        Self::new(url, Duration::from_secs(config.forward_timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn forward(&self, request: NormalizedRequest) -> Outcome {
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HandlerError::from_error(ForwardError::Request(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HandlerError::from_error(ForwardError::Status {
                status: status.as_u16(),
            }));
        }

        let reply: Reply = response
            .json()
            .await
            .map_err(|e| HandlerError::from_error(ForwardError::Decode(e)))?;

        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Error {
                error_message,
                error_type,
            } => {
                tracing::debug!(error_type = ?error_type, "Upstream reported an error");
                Err(HandlerError::new(error_message))
            }
        }
    }
}

impl Handler for ForwardHandler {
    fn handle(&self, request: NormalizedRequest, done: Completion) {
        if done.is_closed() {
            tracing::debug!(
                resource_path = %request.request_context.resource_path,
                "Request abandoned before forwarding"
            );
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.forward(request).await;
            done.finish(outcome);
        });
    }
}
