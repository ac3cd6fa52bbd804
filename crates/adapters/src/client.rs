// Copyright 2025 GraphCL Parity Contributors
// SPDX-License-Identifier: Apache-2.0

//! GraphQL over HTTP.
//!
//! This module provides the endpoint configuration, the request/response
//! envelopes and the [`GraphqlTransport`] seam the parity harness drives.
//! [`HttpGraphqlClient`] is the reqwest-backed implementation.
//!
//! # Example
//!
//! ```ignore
//! use graphcl_parity_adapters::client::{GraphqlEndpoint, GraphqlRequest, GraphqlTransport, HttpGraphqlClient};
//!
//! let endpoint = GraphqlEndpoint::from_base_url("API_1", "http://localhost:1337")
//!     .with_bearer_token("secret");
//! let client = HttpGraphqlClient::new(endpoint)?;
//! let response = client.execute(&GraphqlRequest::new("{ posts { title } }")).await?;
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path appended to a deployment's base URL.
pub const GRAPHQL_PATH: &str = "/graphql";

/// Errors that can occur while talking to a GraphQL endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Endpoint configuration cannot be turned into a client
    #[error("Invalid configuration for endpoint {endpoint}: {message}")]
    InvalidConfig { endpoint: String, message: String },

    /// The request could not be sent or timed out
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The body is not a GraphQL JSON response
    #[error("Invalid JSON response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// A GraphQL deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlEndpoint {
    /// Display name used in logs and reports.
    pub name: String,
    /// Full GraphQL URL.
    pub url: String,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Static bearer token for the `Authorization` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GraphqlEndpoint {
    /// Endpoint at an explicit GraphQL URL.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            bearer_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Endpoint at `<base>/graphql`.
    pub fn from_base_url(name: impl Into<String>, base: &str) -> Self {
        Self::new(name, format!("{}{GRAPHQL_PATH}", base.trim_end_matches('/')))
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the timeout, rounded up to whole seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self
    }

    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject an empty URL or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        let message = if self.url.trim().is_empty() {
            "URL is empty"
        } else if self.timeout_secs == 0 {
            "timeout must be at least one second"
        } else {
            return Ok(());
        };
        Err(ClientError::InvalidConfig {
            endpoint: self.name.clone(),
            message: message.to_string(),
        })
    }

    fn header_map(&self) -> Result<HeaderMap> {
        let invalid = |message: String| ClientError::InvalidConfig {
            endpoint: self.name.clone(),
            message,
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| invalid(format!("header name {name:?}: {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| invalid(format!("header {name:?}: {e}")))?;
            headers.insert(header_name, header_value);
        }
        if let Some(token) = &self.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| invalid(format!("bearer token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

fn variables_absent(variables: &Option<Value>) -> bool {
    match variables {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Body of a GraphQL POST request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    /// Query document.
    pub query: String,
    /// Variables; omitted from the body when absent or empty.
    #[serde(default, skip_serializing_if = "variables_absent")]
    pub variables: Option<Value>,
}

impl GraphqlRequest {
    /// Request without variables.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
        }
    }

    /// Attach variables.
    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// A GraphQL response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    /// `data` member.
    #[serde(default)]
    pub data: Option<Value>,
    /// `errors` member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}

impl GraphqlResponse {
    /// Response carrying only data.
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Whether the response reports at least one GraphQL error.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// The reported errors, possibly none.
    pub fn errors(&self) -> &[Value] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// The `data` member, with a missing or `null` value read as `{}`.
    pub fn data_or_empty(&self) -> Value {
        match &self.data {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(data) => data.clone(),
        }
    }
}

/// Something that executes GraphQL requests against one deployment.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Display name of the deployment.
    fn name(&self) -> &str;

    /// Execute a request and return the decoded response.
    async fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse>;
}

/// reqwest-backed [`GraphqlTransport`].
#[derive(Debug, Clone)]
pub struct HttpGraphqlClient {
    endpoint: GraphqlEndpoint,
    client: reqwest::Client,
}

impl HttpGraphqlClient {
    /// Build a client with the endpoint's headers and timeout.
    pub fn new(endpoint: GraphqlEndpoint) -> Result<Self> {
        endpoint.validate()?;
        let client = reqwest::Client::builder()
            .default_headers(endpoint.header_map()?)
            .timeout(endpoint.timeout())
            .build()
            .map_err(|source| ClientError::Request {
                endpoint: endpoint.name.clone(),
                source,
            })?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl GraphqlTransport for HttpGraphqlClient {
    fn name(&self) -> &str {
        &self.endpoint.name
    }

    async fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse> {
        debug!(endpoint = %self.endpoint.name, url = %self.endpoint.url, "Executing GraphQL request");

        let response = self
            .client
            .post(&self.endpoint.url)
            .json(request)
            .send()
            .await
            .map_err(|source| {
                error!(endpoint = %self.endpoint.name, error = %source, "Request failed");
                ClientError::Request {
                    endpoint: self.endpoint.name.clone(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(endpoint = %self.endpoint.name, status = status.as_u16(), "Request failed");
            return Err(ClientError::Status {
                endpoint: self.endpoint.name.clone(),
                status: status.as_u16(),
            });
        }

        response.json::<GraphqlResponse>().await.map_err(|source| {
            error!(endpoint = %self.endpoint.name, error = %source, "Invalid JSON response");
            ClientError::Decode {
                endpoint: self.endpoint.name.clone(),
                source,
            }
        })
    }
}
