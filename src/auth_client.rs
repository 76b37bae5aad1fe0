//! Authenticated HTTP client with bearer attachment and transparent token refresh

use crate::config::AuthClientConfig;
use crate::cookies::SessionCookies;
use crate::error::{ClientError, Result};
use crate::navigator::{LogNavigator, Navigator};
use crate::request::ApiRequest;
use crate::single_flight::RefreshCoalescer;
use crate::storage::{MemoryStorage, Storage};
use crate::token_store::TokenStore;
use crate::types::RefreshResponse;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Macro to check HTTP response status and return error if not successful
macro_rules! check_response {
    ($response:expr, $error_msg:expr) => {
        if !$response.status().is_success() {
            let status = $response.status();
            let text = $response.text().await.unwrap_or_default();
            return Err($crate::error::ClientError::from_status(
                status,
                format!("{}: {}", $error_msg, text),
            ));
        }
    };
}

pub(crate) use check_response;

/// HTTP client for the Blogsite API
///
/// Every request carries the stored access token as a bearer header. A 401
/// triggers one cookie-based refresh (shared with any other request failing at
/// the same time) and a single resubmission with the new token. If the refresh
/// itself fails the stored session is erased and the navigator is sent to the
/// login path.
///
/// Clones share the transport, the token store and the refresh slot.
#[derive(Clone)]
pub struct AuthClient {
    config: AuthClientConfig,
    http_client: Client,
    token_store: TokenStore,
    navigator: Arc<dyn Navigator>,
    refresh: Arc<RefreshCoalescer>,
}

impl AuthClient {
    /// Create a client with in-memory storage and a logging navigator
    pub fn new(config: AuthClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: AuthClientConfig) -> AuthClientBuilder {
        AuthClientBuilder {
            config,
            storage: None,
            navigator: None,
            refresh: None,
        }
    }

    pub fn config(&self) -> &AuthClientConfig {
        &self.config
    }

    /// Get the token store (for advanced usage)
    pub fn token_store(&self) -> &TokenStore {
        &self.token_store
    }

    /// Transport without the authorization interceptor
    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    /// Send a request through the interceptor and return the raw response
    ///
    /// Error statuses other than a recoverable 401 are returned as responses,
    /// not errors. The result of a resubmission is returned as is, even when it
    /// is another 401.
    pub async fn send(&self, request: ApiRequest) -> Result<Response> {
        let token = self.token_store.access_token();
        let response = self.dispatch(&request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.is_retry() {
            return Ok(response);
        }

        let retry = request.retried();
        debug!(
            method = %retry.method(),
            path = %retry.segments().join("/"),
            "Received 401, refreshing access token"
        );

        let flight = self.refresh.run(|| self.do_refresh()).await;
        let token = match flight.result {
            Ok(token) => token,
            Err(e) => {
                // Waiters on the same failed refresh leave the teardown to its leader.
                if flight.leader {
                    self.end_session();
                }
                return Err(e);
            }
        };

        self.dispatch(&retry, Some(&token)).await
    }

    /// Send a request and decode a successful JSON body
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        check_response!(response, "Request failed");
        Ok(response.json().await?)
    }

    /// Send a request whose successful response carries nothing of interest
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<()> {
        let response = self.send(request).await?;
        check_response!(response, "Request failed");
        Ok(())
    }

    /// Obtain a new access token, joining a refresh that is already in flight
    ///
    /// Unlike a refresh triggered by a 401, a failure here leaves the stored
    /// session in place.
    pub async fn refresh_access_token(&self) -> Result<String> {
        self.refresh.run(|| self.do_refresh()).await.result
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let url = self.config.endpoint(request.segments())?;
        debug!(
            method = %request.method(),
            url = %url,
            attempt = request.attempt(),
            "Sending request"
        );

        let mut builder = self.http_client.request(request.method().clone(), url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Helper method to perform the refresh call
    ///
    /// Goes straight to the transport so a failing refresh can never recurse
    /// into another refresh. The refresh cookie set at login travels in the
    /// client's cookie store, which is persisted next to the token.
    async fn do_refresh(&self) -> Result<String> {
        let url = self.config.endpoint(&["user", "refresh"])?;

        let response = self.http_client.post(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                error = %error_text,
                "Token refresh failed"
            );
            return Err(ClientError::Authentication(format!(
                "Refresh rejected with status {status}: {error_text}"
            )));
        }

        let refreshed: RefreshResponse = response.json().await?;
        self.token_store.set_access_token(&refreshed.access_token)?;
        info!("Access token refreshed successfully");

        Ok(refreshed.access_token)
    }

    /// Tear down the local session after an unrecoverable authentication failure
    fn end_session(&self) {
        if let Err(e) = self.token_store.clear_session() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.navigator.redirect(&self.config.login_path);
    }
}

/// Builder for [`AuthClient`]
pub struct AuthClientBuilder {
    config: AuthClientConfig,
    storage: Option<Arc<dyn Storage>>,
    navigator: Option<Arc<dyn Navigator>>,
    refresh: Option<Arc<RefreshCoalescer>>,
}

impl AuthClientBuilder {
    /// Persist credentials and cookies in `storage` instead of a private in-memory map
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Share the refresh slot with other clients using the same storage
    pub fn refresh_coalescer(mut self, refresh: Arc<RefreshCoalescer>) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn build(self) -> Result<AuthClient> {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()) as Arc<dyn Storage>);
        let cookies = Arc::new(SessionCookies::load(Arc::clone(&storage)));

        let mut client_builder = ClientBuilder::new()
            .cookie_provider(cookies)
            .user_agent(self.config.user_agent.clone());

        if let Some(timeout) = self.config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let token_store = TokenStore::new(storage);

        Ok(AuthClient {
            config: self.config,
            http_client,
            token_store,
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(LogNavigator) as Arc<dyn Navigator>),
            refresh: self.refresh.unwrap_or_default(),
        })
    }
}
