//! Authenticated session and raw HTTP verbs.
//!
//! All paths are relative to the resolved endpoint (e.g. `/v2/content/folders`).
//! A non-2xx response is always turned into [`ApiError::Status`]; nothing is
//! retried.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use sumo_import_core::{Credentials, Endpoint};

use crate::error::ApiError;

/// Default API base, asked during endpoint discovery.
pub const DEFAULT_API_BASE: &str = "https://api.sumologic.com/api";

const DISCOVERY_PATH: &str = "/v1/collectors";
const USER_AGENT: &str = concat!("sumo-import/", env!("CARGO_PKG_VERSION"));

/// Client for the Sumo Logic REST API.
pub struct SumoClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
}

impl SumoClient {
    /// Build the session and resolve the endpoint.
    ///
    /// With [`Endpoint::Discover`] this makes one bootstrap request against
    /// [`DEFAULT_API_BASE`].
    pub async fn connect(credentials: Credentials, endpoint: &Endpoint) -> Result<Self, ApiError> {
        Self::connect_with_bootstrap(credentials, endpoint, DEFAULT_API_BASE).await
    }

    /// Same as [`connect`](Self::connect) with a custom discovery base.
    pub async fn connect_with_bootstrap(
        credentials: Credentials,
        endpoint: &Endpoint,
        bootstrap_base: &str,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(ApiError::Build)?;

        let endpoint = match endpoint {
            Endpoint::Explicit(url) => url.clone(),
            Endpoint::Deployment(code) => format!("https://api.{code}.sumologic.com/api"),
            Endpoint::Discover => discover(&http, &credentials, bootstrap_base).await?,
        };

        info!(endpoint = %endpoint, "API endpoint resolved");

        Ok(Self {
            http,
            endpoint,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        self.send(Method::GET, path, None, query, headers).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        self.send(Method::POST, path, Some(body), query, headers).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: &Value,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        self.send(Method::PUT, path, Some(body), query, headers).await
    }

    pub async fn delete(
        &self,
        path: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        self.send(Method::DELETE, path, None, query, headers).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(method = %method, url = %url, "API request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .basic_auth(
                &self.credentials.access_id,
                Some(&self.credentials.access_key),
            )
            .query(query);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|source| ApiError::Transport {
            method: method.clone(),
            url: url.clone(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                method,
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp)
    }
}

/// Decode a JSON response body.
pub(crate) async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let url = resp.url().to_string();
    resp.json::<T>().await.map_err(|e| ApiError::Decode {
        url,
        reason: e.to_string(),
    })
}

/// The default endpoint redirects to the account's regional deployment.
/// The status of the bootstrap response is irrelevant; only its final URL is used.
async fn discover(
    http: &reqwest::Client,
    credentials: &Credentials,
    bootstrap_base: &str,
) -> Result<String, ApiError> {
    let url = format!("{bootstrap_base}{DISCOVERY_PATH}");
    debug!(url = %url, "Discovering API endpoint");

    let resp = http
        .get(&url)
        .basic_auth(&credentials.access_id, Some(&credentials.access_key))
        .send()
        .await
        .map_err(|source| ApiError::Transport {
            method: Method::GET,
            url: url.clone(),
            source,
        })?;

    let final_url = resp.url().as_str();
    match final_url.find(DISCOVERY_PATH) {
        Some(idx) => Ok(final_url[..idx].to_string()),
        None => Err(ApiError::Discovery(format!(
            "bootstrap request ended at unexpected URL {final_url}"
        ))),
    }
}
