//! HttpConnection - reqwest-backed site connection

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Proxy};
use serde::Deserialize;
use tracing::{debug, instrument};

use contracts::{ContractError, ServerVersion, SiteConfig, SiteConnection};

/// Path of the site info endpoint used for the capability probe
pub const SITE_INFO_ENDPOINT: &str = "api3/info/";

/// Subset of the site info document the probe needs
#[derive(Debug, Deserialize)]
struct SiteInfo {
    #[serde(default)]
    version: Option<Vec<u64>>,
}

/// Connection to a remote site over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpConnection {
    base_url: String,
    session_token: String,
    client: Client,
}

impl HttpConnection {
    /// Build a client from site configuration.
    ///
    /// The proxy URL, if any, is handed to reqwest untouched.
    pub fn new(config: &SiteConfig) -> Result<Self, ContractError> {
        let mut builder = Client::builder().timeout(config.timeout());

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy).map_err(|e| {
                ContractError::site_connection(&config.base_url, format!("invalid proxy: {e}"))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            ContractError::site_connection(&config.base_url, format!("failed to build client: {e}"))
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_token: config.session_token.clone(),
            client,
        })
    }

    fn info_url(&self) -> String {
        format!("{}/{}", self.base_url, SITE_INFO_ENDPOINT)
    }

    fn transport_error(&self, e: reqwest::Error) -> ContractError {
        ContractError::site_connection(&self.base_url, e.to_string())
    }
}

impl SiteConnection for HttpConnection {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(name = "http_connection_server_version", skip(self), fields(site = %self.base_url))]
    async fn server_version(&self) -> Result<Option<ServerVersion>, ContractError> {
        let url = self.info_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::HttpStatus {
                site: self.base_url.clone(),
                url,
                status: status.as_u16(),
            });
        }

        let info: SiteInfo = response.json().await.map_err(|e| self.transport_error(e))?;
        let version = match info.version {
            Some(components) => Some(ServerVersion::from_components(&components)?),
            None => None,
        };

        debug!(site = %self.base_url, version = ?version, "Site info fetched");
        Ok(version)
    }

    async fn session_token(&self) -> Result<String, ContractError> {
        if self.session_token.is_empty() {
            return Err(ContractError::site_connection(
                &self.base_url,
                "no session token configured",
            ));
        }
        Ok(self.session_token.clone())
    }

    #[instrument(
        name = "http_connection_post_json",
        skip(self, body),
        fields(site = %self.base_url, bytes = body.len())
    )]
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<(), ContractError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::HttpStatus {
                site: self.base_url.clone(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(site = %self.base_url, status = status.as_u16(), "Metrics posted");
        Ok(())
    }
}
