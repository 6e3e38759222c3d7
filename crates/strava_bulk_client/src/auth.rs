//! Browser-style login: CSRF token from the login page, then a form POST.

use crate::StravaError;
use crate::csrf::extract_csrf_token;
use crate::session::{LOGIN_PATH, SESSION_PATH, SessionClient};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, LOCATION};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

/// Server-issued token echoed back on every state-changing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub struct Authenticator<'a> {
    client: &'a SessionClient,
}

impl<'a> Authenticator<'a> {
    pub fn new(client: &'a SessionClient) -> Self {
        Self { client }
    }

    /// Log in with `email`/`password`.
    ///
    /// On success the session cookie stays in the client's cookie store and the
    /// CSRF token is returned for the requests that follow.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CsrfToken, StravaError> {
        info!("Logging into Strava...");
        let token = self.fetch_token().await?;
        self.submit(email, password, &token).await?;
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<CsrfToken, StravaError> {
        let url = self.client.url(LOGIN_PATH);
        let resp = self.client.get(&url, HeaderMap::new()).await?;
        if !resp.status().is_success() {
            return Err(StravaError::UnexpectedStatus {
                url,
                status: resp.status().as_u16(),
            });
        }
        let html = resp.text().await?;
        extract_csrf_token(&html).map(CsrfToken)
    }

    async fn submit(
        &self,
        email: &str,
        password: &SecretString,
        token: &CsrfToken,
    ) -> Result<(), StravaError> {
        let url = self.client.url(SESSION_PATH);
        let fields = [
            ("email", email),
            ("password", password.expose_secret()),
            ("authenticity_token", token.as_str()),
        ];
        let resp = self.client.post_form(&url, &fields).await?;
        let status = resp.status();
        if status != StatusCode::FOUND {
            return Err(StravaError::AuthenticationFailed(status.as_u16()));
        }
        if let Some(location) = resp.headers().get(LOCATION).and_then(|v| v.to_str().ok()) {
            debug!(location, "login redirected");
        }
        Ok(())
    }
}
