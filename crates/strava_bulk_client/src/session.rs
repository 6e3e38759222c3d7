//! Cookie-bearing HTTP session that never follows redirects.
//!
//! Redirect statuses are the server's success/failure signal for login and for
//! expired sessions, so they have to reach the caller untouched.

use crate::activities::decode_page;
use crate::auth::CsrfToken;
use crate::update::UpdatePayload;
use crate::{PageResult, StravaError, TrainingLog};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode, redirect};
use tracing::debug;

pub const LOGIN_PATH: &str = "/login";
pub const SESSION_PATH: &str = "/session";
pub const ACTIVITIES_PATH: &str = "/athlete/training_activities";

/// HTTP client owning the cookie store for the whole run.
#[derive(Clone, Debug)]
pub struct SessionClient {
    base_url: String,
    client: reqwest::Client,
}

impl SessionClient {
    /// Build a client rooted at `base_url` (e.g. "https://www.strava.com").
    pub fn new(base_url: &str) -> Result<Self, StravaError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Absolute URL for a path on the configured host.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<Response, StravaError> {
        Ok(self.client.get(url).headers(headers).send().await?)
    }

    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<Response, StravaError> {
        Ok(self.client.post(url).form(fields).send().await?)
    }

    pub async fn put(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Response, StravaError> {
        Ok(self.client.put(url).headers(headers).body(body).send().await?)
    }
}

/// A logged-in session: the client with its cookies plus the CSRF token.
#[derive(Clone, Debug)]
pub struct AuthenticatedSession {
    client: SessionClient,
    token: CsrfToken,
}

impl AuthenticatedSession {
    pub fn new(client: SessionClient, token: CsrfToken) -> Self {
        Self { client, token }
    }

    /// Headers the listing and update endpoints need to answer with JSON.
    fn ajax_headers(&self) -> Result<HeaderMap, StravaError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(self.token.as_str())
            .map_err(|e| StravaError::Config(format!("CSRF token is not a valid header: {e}")))?;
        headers.insert("X-CSRF-Token", token);
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        Ok(headers)
    }
}

#[async_trait]
impl TrainingLog for AuthenticatedSession {
    async fn fetch_page(&self, page: u32) -> Result<PageResult, StravaError> {
        let url = format!("{}?page={}", self.client.url(ACTIVITIES_PATH), page);
        debug!(page, "requesting activity listing page");
        let resp = self.client.get(&url, self.ajax_headers()?).await?;
        match resp.status() {
            StatusCode::OK => {}
            // Unauthenticated sessions are bounced to the login page.
            StatusCode::MOVED_PERMANENTLY => return Err(StravaError::UnauthorizedSession),
            status => {
                return Err(StravaError::UnexpectedStatus {
                    url,
                    status: status.as_u16(),
                });
            }
        }
        let body = resp.bytes().await?;
        decode_page(&body)
    }

    async fn update_activity(
        &self,
        activity_id: i64,
        payload: &UpdatePayload,
    ) -> Result<(), StravaError> {
        let url = format!("{}/{}", self.client.url(ACTIVITIES_PATH), activity_id);
        let body = serde_json::to_vec(payload)?;
        let mut headers = self.ajax_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self.client.put(&url, headers, body).await?;
        if resp.status() != StatusCode::OK {
            return Err(StravaError::UnexpectedStatus {
                url,
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}
