//! SiteConnection trait - Dispatcher transport interface
//!
//! Abstracts the remote site a worker talks to: capability probe,
//! session token and the JSON POST itself.

use crate::{ContractError, ServerVersion};

/// Transport to a remote metrics collector
///
/// Implementations are shared between dispatch workers, so every method
/// takes `&self`.
#[trait_variant::make(SiteConnection: Send)]
pub trait LocalSiteConnection {
    /// Site base URL, without the endpoint path
    fn base_url(&self) -> &str;

    /// Query the version advertised by the site
    ///
    /// `Ok(None)` means the site does not advertise a version at all.
    async fn server_version(&self) -> Result<Option<ServerVersion>, ContractError>;

    /// Session token used to authenticate a metrics request
    async fn session_token(&self) -> Result<String, ContractError>;

    /// POST a JSON body to `url`
    ///
    /// # Errors
    /// Connection failures and non-success HTTP statuses
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<(), ContractError>;
}
