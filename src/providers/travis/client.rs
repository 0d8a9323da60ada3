use log::{debug, error, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use url::Url;

use crate::auth::Token;
use crate::config::DecodePolicy;
use crate::error::{Result, TravisDumpError};

use super::types::BuildsPage;

const API_VERSION_HEADER: &str = "travis-api-version";
const API_VERSION: &str = "3";
const SORT_BY: &str = "started_at:desc";

/// Travis CI v3 API client.
///
/// Issues exactly one request per call. There is no retry or caching;
/// transport failures are returned to the caller as fatal errors.
pub struct TravisClient {
    client: Client,
    api_url: Url,
    decode_policy: DecodePolicy,
}

impl TravisClient {
    /// Create a new Travis API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Travis API base URL (e.g., <https://api.travis-ci.com>)
    /// * `token` - Optional API token, sent as `Authorization: token ...`
    /// * `decode_policy` - How to treat a response body that does not decode
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or the token cannot be turned into a
    /// valid request.
    pub fn new(base_url: &str, token: Option<Token>, decode_policy: DecodePolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_VERSION_HEADER),
            HeaderValue::from_static(API_VERSION),
        );

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&token.header_value())
                .map_err(|e| TravisDumpError::Request(format!("Invalid API token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            warn!("No Travis API token configured, sending unauthenticated requests");
        }

        let client = Client::builder()
            .user_agent(concat!("travis-dump/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| TravisDumpError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(base_url)
            .map_err(|e| TravisDumpError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            decode_policy,
        })
    }

    /// Construct the build listing URL for one page.
    pub fn builds_url(&self, repository: &str, limit: usize, offset: u64) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TravisDumpError::Request(format!("Base URL cannot have a path: {}", self.api_url))
            })?
            .pop_if_empty()
            .extend(["repo", repository, "builds"]);
        url.set_query(Some(&format!(
            "limit={limit}&offset={offset}&sort_by={SORT_BY}"
        )));
        Ok(url)
    }

    /// Fetch one page of builds, newest first.
    ///
    /// A non-success status is logged and the body is decoded anyway, since
    /// Travis answers with a JSON error resource. Under the lenient policy a
    /// body that does not decode is logged and an empty page is returned.
    ///
    /// # Errors
    ///
    /// Request construction and transport failures are always errors. A
    /// decode failure is an error only under [`DecodePolicy::Strict`].
    pub async fn fetch_builds(
        &self,
        repository: &str,
        limit: usize,
        offset: u64,
    ) -> Result<BuildsPage> {
        let url = self.builds_url(repository, limit, offset)?;
        debug!("GET {url}");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Travis API returned status {status} for offset {offset}");
        }

        let body = response.text().await?;

        match serde_json::from_str::<BuildsPage>(&body) {
            Ok(page) => Ok(page),
            Err(source) => match self.decode_policy {
                DecodePolicy::Strict => Err(TravisDumpError::Decode { offset, source }),
                DecodePolicy::Lenient => {
                    error!("Failed to decode builds page at offset {offset}: {source}");
                    Ok(BuildsPage::default())
                }
            },
        }
    }
}
