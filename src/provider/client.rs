//! Identity/subscription provider client.
//!
//! # Responsibilities
//! - Delegate sign-in, sign-up, sign-out, and password flows
//! - Read `profiles` and `subscriptions` rows keyed by user id
//! - Turn the two rows into an [`AccessInfo`] decision
//!
//! # Design Decisions
//! - The provider is treated as already reliable; one bounded timeout,
//!   no retry layer (that belongs to the cold-starting chat backend only)
//! - Missing rows are `Ok(None)`, not errors
//! - Every request carries the project `apikey` header

use std::time::Duration;

use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::access::{resolve_access, AccessInfo, Profile, Subscription};
use crate::config::ProviderConfig;
use crate::observability::metrics;
use crate::provider::types::{AuthUser, ProviderError, ProviderResult, Session};

const APIKEY_HEADER: &str = "apikey";

/// Client for the identity provider's REST surface.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    developer_emails: Vec<String>,
}

impl ProviderClient {
    /// Build a client from validated configuration.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let base_url = config
            .base_url
            .parse::<Url>()
            .map_err(|e| ProviderError::Config(format!("base_url: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ProviderError::Transport)?;

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
            developer_emails: config.developer_emails.clone(),
        })
    }

    /// The configured developer allow-list.
    pub fn developer_emails(&self) -> &[String] {
        &self.developer_emails
    }

    fn endpoint(&self, path: &str) -> ProviderResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::Config(format!("{path}: {e}")))
    }

    /// Exchange email/password credentials for a session.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<Session> {
        let url = self.endpoint("/auth/v1/token")?;
        let response = self
            .http
            .post(url)
            .query(&[("grant_type", "password")])
            .header(APIKEY_HEADER, &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNAUTHORIZED
        {
            return Err(ProviderError::InvalidCredentials);
        }
        decode(expect_success(response).await?).await
    }

    /// Register a new account. The provider issues a session immediately.
    pub async fn sign_up(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
    ) -> ProviderResult<Session> {
        let url = self.endpoint("/auth/v1/signup")?;
        let response = self
            .http
            .post(url)
            .header(APIKEY_HEADER, &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;

        decode(expect_success(response).await?).await
    }

    /// Fetch the user behind an access token.
    pub async fn get_user(&self, access_token: &str) -> ProviderResult<AuthUser> {
        let url = self.endpoint("/auth/v1/user")?;
        let response = self
            .http
            .get(url)
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized);
        }
        decode(expect_success(response).await?).await
    }

    /// Revoke a session.
    pub async fn sign_out(&self, access_token: &str) -> ProviderResult<()> {
        let url = self.endpoint("/auth/v1/logout")?;
        let response = self
            .http
            .post(url)
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await?;

        expect_success(response).await.map(|_| ())
    }

    /// Send a password-reset email.
    pub async fn request_password_reset(&self, email: &str) -> ProviderResult<()> {
        let url = self.endpoint("/auth/v1/recover")?;
        let response = self
            .http
            .post(url)
            .header(APIKEY_HEADER, &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;

        expect_success(response).await.map(|_| ())
    }

    /// Set a new password for the session's user.
    pub async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> ProviderResult<()> {
        let url = self.endpoint("/auth/v1/user")?;
        let response = self
            .http
            .put(url)
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .json(&json!({ "password": new_password }))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized);
        }
        expect_success(response).await.map(|_| ())
    }

    /// Read the profile row for a user, if one exists yet.
    pub async fn fetch_profile(&self, user_id: &str) -> ProviderResult<Option<Profile>> {
        let url = self.endpoint("/rest/v1/profiles")?;
        let response = self
            .http
            .get(url)
            .query(&[("id", format!("eq.{user_id}")), ("select", "*".into())])
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key))
            .send()
            .await?;

        first_row(expect_success(response).await?).await
    }

    /// Read the newest subscription row for a user, if one exists.
    pub async fn fetch_subscription(&self, user_id: &str) -> ProviderResult<Option<Subscription>> {
        let url = self.endpoint("/rest/v1/subscriptions")?;
        let response = self
            .http
            .get(url)
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("select", "*".into()),
                ("order", "created_at.desc".into()),
                ("limit", "1".into()),
            ])
            .header(APIKEY_HEADER, &self.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.anon_key))
            .send()
            .await?;

        first_row(expect_success(response).await?).await
    }

    /// Fetch both rows for a user and resolve their access tier.
    pub async fn load_access(&self, user: &AuthUser) -> ProviderResult<AccessInfo> {
        let (profile, subscription) = tokio::join!(
            self.fetch_profile(&user.id),
            self.fetch_subscription(&user.id)
        );
        let (profile, subscription) = (profile?, subscription?);

        let info = resolve_access(
            user.email.as_deref(),
            profile.as_ref(),
            subscription.as_ref(),
            &self.developer_emails,
            Utc::now(),
        );
        metrics::record_access_decision(info.has_premium_access);
        tracing::debug!(
            user_id = %user.id,
            has_premium_access = info.has_premium_access,
            is_developer = info.is_developer,
            plan = info.plan.as_str(),
            status = info.status.as_str(),
            "Resolved access tier"
        );
        Ok(info)
    }
}

async fn expect_success(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Row reads come back as a JSON array; the caller wants at most one row.
async fn first_row<T: DeserializeOwned>(response: Response) -> ProviderResult<Option<T>> {
    let rows: Vec<T> = decode(response).await?;
    Ok(rows.into_iter().next())
}
