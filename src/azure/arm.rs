//! Azure Resource Manager REST client.
//!
//! Thin wrapper over `reqwest` that adds the bearer token, decodes ARM
//! error envelopes, follows `nextLink` pagination and waits for
//! long-running operations to finish.

use super::credential::TokenProvider;
use crate::error::{Error, Result};
use crate::models::{ArmErrorDetail, ArmErrorResponse, AsyncOperationStatus, Page};
use colored::Colorize;
use reqwest::header::HeaderMap;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// API version for `Microsoft.Resources/resourceGroups`.
pub const RESOURCES_API_VERSION: &str = "2021-04-01";
/// API version for `Microsoft.Network` resources.
pub const NETWORK_API_VERSION: &str = "2023-09-01";

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn TokenProvider>,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl ArmClient {
    pub fn new(
        endpoint: &str,
        tokens: Arc<dyn TokenProvider>,
        poll_interval: Duration,
        operation_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(ArmClient {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            tokens,
            poll_interval,
            operation_timeout,
        })
    }

    /// Absolute URL for an ARM resource path.
    pub fn url(&self, path: &str, api_version: &str) -> String {
        format!("{}{path}?api-version={api_version}", self.endpoint)
    }

    /// Send a request and return the response whatever its status.
    async fn send_raw<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        log::debug!("{} {url}", method.as_str().on_blue());
        let token = self.tokens.bearer_token().await?;
        let mut request = self.http.request(method.clone(), url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        log::debug!(
            "{} {url} -> {status}",
            method.as_str(),
            status = response.status()
        );
        Ok(response)
    }

    /// Send a request; non-success statuses become [`Error`].
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let response = self.send_raw(method, url, body).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(url, response).await)
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<T> {
        let url = self.url(path, api_version);
        let response = self.send::<()>(Method::GET, &url, None).await?;
        decode(&url, response).await
    }

    /// Like [`ArmClient::get`] but a 404 is `Ok(None)`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Option<T>> {
        match self.get(path, api_version).await {
            Ok(value) => Ok(Some(value)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Collect every page of an ARM list call.
    pub async fn list<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let first_url = self.url(path, api_version);
        let mut visited = HashSet::from([first_url.clone()]);
        let mut next_url = Some(first_url);
        let mut count_pages = 0;

        while let Some(url) = next_url.take() {
            let response = self.send::<()>(Method::GET, &url, None).await?;
            let page: Page<T> = decode(&url, response).await?;
            let count = page.value.len();
            items.extend(page.value);

            if let Some(next) = page.next_link.filter(|n| !n.is_empty()) {
                if !visited.insert(next.clone()) {
                    return Err(Error::Azure {
                        status: 200,
                        code: "InvalidNextLink".to_string(),
                        message: format!("nextLink not unique - possible infinite loop: {next}"),
                    });
                }
                next_url = Some(next);
            }
            log::debug!(
                "got page#{count_pages:2} record_count=+{count:3} => {total:3}",
                total = items.len()
            );
            count_pages += 1;
        }

        Ok(items)
    }

    /// PUT that completes synchronously (e.g. resource groups).
    pub async fn put<B, T>(&self, path: &str, api_version: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, api_version);
        let response = self.send(Method::PUT, &url, Some(body)).await?;
        decode(&url, response).await
    }

    /// PUT a resource, wait for the long-running operation, then read it back.
    pub async fn put_and_wait<B, T>(&self, path: &str, api_version: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, api_version);
        let response = self.send(Method::PUT, &url, Some(body)).await?;
        self.wait_for_completion(&url, response, false).await?;
        self.get(path, api_version).await
    }

    /// DELETE a resource and wait for the long-running operation.
    pub async fn delete_and_wait(&self, path: &str, api_version: &str) -> Result<()> {
        let url = self.url(path, api_version);
        let response = self.send::<()>(Method::DELETE, &url, None).await?;
        self.wait_for_completion(&url, response, true).await
    }

    async fn wait_for_completion(
        &self,
        url: &str,
        response: Response,
        deleting: bool,
    ) -> Result<()> {
        let headers = response.headers();
        let async_operation = header_value(headers, "azure-asyncoperation");
        let location = header_value(headers, "location");
        let delay = retry_after(headers).unwrap_or(self.poll_interval);

        if let Some(operation_url) = async_operation {
            self.poll_async_operation(url, &operation_url, delay).await
        } else if response.status() == StatusCode::ACCEPTED {
            match location {
                Some(location_url) => {
                    self.poll_location(url, &location_url, delay, deleting)
                        .await
                }
                None => {
                    log::warn!("202 Accepted without polling headers for {url}");
                    Ok(())
                }
            }
        } else {
            Ok(())
        }
    }

    /// Poll an `Azure-AsyncOperation` URL until it reaches a terminal status.
    async fn poll_async_operation(
        &self,
        url: &str,
        operation_url: &str,
        mut delay: Duration,
    ) -> Result<()> {
        let started = Instant::now();
        let mut count_polls = 0;
        loop {
            tokio::time::sleep(self.capped_delay(started, url, delay)?).await;

            let response = self.send::<()>(Method::GET, operation_url, None).await?;
            delay = retry_after(response.headers()).unwrap_or(self.poll_interval);
            let status: AsyncOperationStatus = decode(operation_url, response).await?;
            log::info!(
                "poll#{count_polls:2} {url} status={status}",
                status = status.status
            );
            count_polls += 1;

            if status.is_terminal() {
                if status.is_success() {
                    return Ok(());
                }
                let detail = status.error.unwrap_or(ArmErrorDetail {
                    code: status.status.clone(),
                    message: format!("Operation {}", status.status),
                });
                return Err(Error::Azure {
                    status: 200,
                    code: detail.code,
                    message: detail.message,
                });
            }
        }
    }

    /// Poll a `Location` URL until it stops answering 202.
    async fn poll_location(
        &self,
        url: &str,
        location_url: &str,
        mut delay: Duration,
        deleting: bool,
    ) -> Result<()> {
        let started = Instant::now();
        let mut count_polls = 0;
        loop {
            tokio::time::sleep(self.capped_delay(started, url, delay)?).await;

            let response = self.send_raw::<()>(Method::GET, location_url, None).await?;
            let status = response.status();
            log::info!("poll#{count_polls:2} {url} location status={status}");
            count_polls += 1;

            if status == StatusCode::ACCEPTED {
                delay = retry_after(response.headers()).unwrap_or(self.poll_interval);
                continue;
            }
            if status.is_success() || (deleting && status == StatusCode::NOT_FOUND) {
                return Ok(());
            }
            return Err(error_from_response(location_url, response).await);
        }
    }

    /// `delay` cut down to the time left before `operation_timeout`.
    fn capped_delay(&self, started: Instant, url: &str, delay: Duration) -> Result<Duration> {
        let remaining = self.operation_timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            log::error!("Timed out waiting for {url}");
            return Err(Error::Timeout(
                self.operation_timeout.as_secs(),
                url.to_string(),
            ));
        }
        Ok(delay.min(remaining))
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// `Retry-After` in whole seconds; HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    header_value(headers, "retry-after")?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Decode a JSON body, reporting the failing JSON path.
async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let text = response.text().await?;
    let mut deserializer = serde_json::Deserializer::from_str(&text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("RESPONSE START:\n\n{text}\n\nRESPONSE END\n");
        Error::Decode {
            url: url.to_string(),
            path: e.path().to_string(),
            source: e.into_inner(),
        }
    })
}

/// Turn a non-success ARM response into an [`Error`].
async fn error_from_response(url: &str, response: Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ArmErrorResponse>(&text) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) if text.trim().is_empty() => (
            status.as_str().to_string(),
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        ),
        Err(_) => (status.as_str().to_string(), text),
    };
    log::warn!(
        "{failed} {url} status={status} code={code} message={message}",
        failed = "failed".on_red()
    );

    if status == StatusCode::NOT_FOUND {
        Error::NotFound { code, message }
    } else {
        Error::Azure {
            status: status.as_u16(),
            code,
            message,
        }
    }
}
