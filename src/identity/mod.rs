//! HTTP client for the external identity provider.
//!
//! The provider owns user records; this service only looks users up by
//! email and patches the email-verified flag or the password after a
//! passcode checks out. First failure is terminal for the request, no
//! retries.

use crate::cli::globals::GlobalArgs;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// User record as returned by the provider.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default, rename = "emailVerified")]
    pub email_verified: bool,
}

/// Partial update applied to a user, one field at a time.
#[derive(Debug, Default, Serialize)]
pub struct IdentityUpdate {
    #[serde(rename = "emailVerified", skip_serializing_if = "Option::is_none")]
    email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

impl IdentityUpdate {
    #[must_use]
    pub fn email_verified() -> Self {
        Self {
            email_verified: Some(true),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn password(password: String) -> Self {
        Self {
            password: Some(password),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up a user by email, erroring when absent.
    async fn get_by_email(&self, email: &str) -> Result<Identity>;

    /// Apply `update` to the user with id `id`.
    async fn update_user(&self, id: &str, update: IdentityUpdate) -> Result<()>;
}

#[instrument(skip(globals))]
pub fn endpoint_url(globals: &GlobalArgs, endpoint: &str) -> Result<String> {
    let url = Url::parse(&globals.identity_url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{endpoint}");

    debug!("endpoint URL: {}", endpoint);

    Ok(endpoint_url)
}

/// Bearer-token client talking to the provider's REST API.
#[derive(Debug)]
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl HttpIdentityProvider {
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let client = Client::builder().user_agent(APP_USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: endpoint_url(globals, "")?,
            token: globals.identity_token.clone(),
        })
    }

    fn provider_message(json_response: &Value) -> &str {
        json_response["error"]
            .as_str()
            .or_else(|| json_response["errors"][0].as_str())
            .unwrap_or("")
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> Result<Identity> {
        let lookup_url = format!("{}/v1/users", self.base_url);

        let response = self
            .client
            .get(&lookup_url)
            .query(&[("email", email)])
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or_default();

            return Err(anyhow!(
                "{} - {}, {}",
                lookup_url,
                status,
                Self::provider_message(&json_response)
            ));
        }

        let identity: Identity = response.json().await?;

        Ok(identity)
    }

    #[instrument(skip(self, update))]
    async fn update_user(&self, id: &str, update: IdentityUpdate) -> Result<()> {
        let update_url = format!("{}/v1/users/{id}", self.base_url);

        let response = self
            .client
            .patch(&update_url)
            .bearer_auth(self.token.expose_secret())
            .json(&update)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or_default();

            return Err(anyhow!(
                "{} - {}, {}",
                update_url,
                status,
                Self::provider_message(&json_response)
            ));
        }

        Ok(())
    }
}
