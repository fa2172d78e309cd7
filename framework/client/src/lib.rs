use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

mod error;
mod token;
mod wire;

pub use error::ClientError;

use token::TokenCache;
use wire::{CreateSourceRequest, ErrorResponse, LoginRequest, LoginResponse, SqlRequest, SqlResponse};

/// One configured cluster. Immutable for the lifetime of a benchmark session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTarget {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default = "default_tls")]
    pub tls: bool,
}

fn default_tls() -> bool {
    true
}

impl ClusterTarget {
    /// Base URL of the cluster's REST API.
    pub fn api_base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}/api/v3", scheme, self.host, self.port)
    }
}

/// Result of a successfully executed query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub row_count: u64,
    pub columns: Vec<String>,
    /// Execution time as reported by the engine, as opposed to the wall clock time measured by
    /// the run executor.
    pub engine_elapsed: Duration,
}

/// Client for one cluster's query API.
///
/// Stateless per call apart from the cached authentication token, so a single instance is shared
/// by every worker targeting the cluster.
#[derive(Debug)]
pub struct ClusterClient {
    target: ClusterTarget,
    base_url: String,
    http: reqwest::Client,
    token: TokenCache,
}

impl ClusterClient {
    /// Build a client for the given target. Fails if the target does not form a valid URL.
    pub fn connect(target: ClusterTarget) -> anyhow::Result<Self> {
        let base_url = target.api_base_url();
        url::Url::parse(&base_url)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("lakebench/", env!("CARGO_PKG_VERSION")))
            .build()?;

        log::debug!("Created client for cluster {} at {}", target.id, base_url);

        Ok(Self {
            target,
            base_url,
            http,
            token: TokenCache::default(),
        })
    }

    pub fn target(&self) -> &ClusterTarget {
        &self.target
    }

    /// Eagerly authenticate, used as the scheduler's pre-flight connectivity check.
    pub async fn probe(&self) -> Result<(), ClientError> {
        self.current_token().await?;
        log::info!("Cluster {} is reachable", self.target.id);
        Ok(())
    }

    /// Execute one query, racing it against `timeout`.
    ///
    /// On expiry the in-flight request is dropped, which cancels it as far as this process is
    /// concerned, and [ClientError::TimedOut] is returned so that the caller can record a
    /// timeout rather than a failure. An HTTP 401 triggers a single token refresh and one
    /// retry, a second rejection is surfaced as [ClientError::AuthRejected].
    pub async fn execute(&self, sql: &str, timeout: Duration) -> Result<QueryResult, ClientError> {
        match tokio::time::timeout(timeout, self.execute_inner(sql)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::TimedOut { after: timeout }),
        }
    }

    async fn execute_inner(&self, sql: &str) -> Result<QueryResult, ClientError> {
        let token = self.current_token().await?;
        match self.submit(sql, &token).await? {
            Submitted::Completed(result) => Ok(result),
            Submitted::AuthExpired => {
                let token = self
                    .token
                    .refresh(&token, || self.login())
                    .await?;
                match self.submit(sql, &token).await? {
                    Submitted::Completed(result) => Ok(result),
                    Submitted::AuthExpired => Err(ClientError::AuthRejected {
                        cluster: self.target.id.clone(),
                        message: "token rejected immediately after refresh".to_string(),
                    }),
                }
            }
        }
    }

    /// Register another cluster as a catalog source, used to set up cross-cluster queries.
    /// An already-existing source of the same name is not an error.
    pub async fn create_source(
        &self,
        name: &str,
        source_type: &str,
        config: serde_json::Value,
    ) -> Result<(), ClientError> {
        let token = self.current_token().await?;
        let response = self
            .http
            .post(format!("{}/catalog", self.base_url))
            .bearer_auth(&token)
            .json(&CreateSourceRequest {
                entity_type: "source",
                name,
                source_type,
                config,
            })
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            if status == reqwest::StatusCode::CONFLICT {
                log::info!(
                    "Source {} already exists on cluster {}",
                    name,
                    self.target.id
                );
            }
            return Ok(());
        }

        Err(self.engine_error(status, response).await)
    }

    async fn submit(&self, sql: &str, token: &str) -> Result<Submitted, ClientError> {
        let started = Instant::now();
        let response = self
            .http
            .post(format!("{}/sql", self.base_url))
            .bearer_auth(token)
            .json(&SqlRequest { sql })
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            log::debug!("Cluster {} rejected the cached token", self.target.id);
            return Ok(Submitted::AuthExpired);
        }
        if !status.is_success() {
            return Err(self.engine_error(status, response).await);
        }

        let body: SqlResponse = response.json().await.map_err(|e| self.transport(e))?;
        log::debug!(
            "Cluster {} returned {} rows in {:?}",
            self.target.id,
            body.row_count,
            started.elapsed()
        );

        Ok(Submitted::Completed(QueryResult {
            row_count: body.row_count,
            columns: body.columns,
            engine_elapsed: Duration::from_millis(body.elapsed_millis),
        }))
    }

    async fn current_token(&self) -> Result<String, ClientError> {
        self.token.get_or_login(|| self.login()).await
    }

    async fn login(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&LoginRequest {
                user_name: &self.target.username,
                password: &self.target.password,
            })
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|payload| payload.error_message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(ClientError::AuthRejected {
                cluster: self.target.id.clone(),
                message,
            });
        }

        let body: LoginResponse = response.json().await.map_err(|e| self.transport(e))?;
        log::info!("Authenticated to cluster {}", self.target.id);
        Ok(body.token)
    }

    /// Turn a non-2xx response into a query error, keeping the engine's message verbatim.
    async fn engine_error(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ClientError {
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|payload| payload.error_message)
            .unwrap_or_else(|_| format!("HTTP {status}"));

        ClientError::Query {
            cluster: self.target.id.clone(),
            status: status.as_u16(),
            message,
        }
    }

    fn transport(&self, source: reqwest::Error) -> ClientError {
        ClientError::Transport {
            cluster: self.target.id.clone(),
            source,
        }
    }
}

enum Submitted {
    Completed(QueryResult),
    AuthExpired,
}
