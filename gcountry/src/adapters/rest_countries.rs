//! REST Countries source backed by a reqwest client.

use std::time::Duration;

use gcommon::BoxFuture;
use reqwest::{Client, Response, StatusCode, Url};

use crate::source::CountrySource;
use crate::wire::{decode_country, decode_country_names};
use crate::{CountryError, CountryRecord};

pub const DEFAULT_BASE_URL: &str = "https://restcountries.com/v3.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RestCountriesSource {
    client: Client,
    base_url: String,
}

impl RestCountriesSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Builds its own client with a per-request timeout and `User-Agent`.
    pub fn with_client_options(timeout: Duration, user_agent: &str) -> Result<Self, CountryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| CountryError::transport(err.to_string()))?;
        Ok(Self::new(client))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CountryError> {
        let mut url = Url::parse(self.base_url.trim_end_matches('/')).map_err(|err| {
            CountryError::invalid_request(format!("invalid base url '{}': {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                CountryError::invalid_request(format!(
                    "base url '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_text(&self, url: Url, query: &[(&str, &str)]) -> Result<String, CountryError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CountryError::timeout(err.to_string())
                } else {
                    CountryError::transport(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|err| CountryError::transport(err.to_string()))?;
        if body.trim().is_empty() {
            return Err(CountryError::not_found("remote source returned an empty body"));
        }
        Ok(body)
    }

    async fn parse_error(response: Response) -> CountryError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            format!("country request failed with status {status}")
        } else {
            format!("country request failed with status {status}: {}", body.trim())
        };
        classify_status(status, message)
    }
}

pub(crate) fn classify_status(status: StatusCode, message: String) -> CountryError {
    match status {
        StatusCode::NOT_FOUND => CountryError::not_found(message),
        StatusCode::TOO_MANY_REQUESTS => CountryError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CountryError::timeout(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            CountryError::invalid_request(message)
        }
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            CountryError::unavailable(message)
        }
        status if status.is_server_error() => CountryError::transport(message),
        _ => CountryError::invalid_request(message),
    }
}

impl CountrySource for RestCountriesSource {
    fn fetch_country<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<CountryRecord, CountryError>> {
        Box::pin(async move {
            let url = self.endpoint(&["name", name])?;
            let body = self.get_text(url, &[("fullText", "true")]).await?;
            decode_country(&body, name)
        })
    }

    fn list_country_names<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>, CountryError>> {
        Box::pin(async move {
            let url = self.endpoint(&["all"])?;
            let body = self.get_text(url, &[("fields", "name")]).await?;
            decode_country_names(&body)
        })
    }
}
