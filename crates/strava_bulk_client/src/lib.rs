//! Bulk editing of Strava activities through the website's own session flow.
//!
//! There is no public API involved: the client logs in the way a browser does
//! (CSRF token from the login page, form POST, session cookie), walks the
//! training-activities listing and PUTs a sparse update to each activity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod activities;
pub mod auth;
pub mod config;
pub mod csrf;
pub mod session;
pub mod types;
pub mod update;

pub use activities::{ActivityEnumerator, DateRange};
pub use auth::{Authenticator, CsrfToken};
pub use config::{Config, Credentials};
pub use session::{AuthenticatedSession, SessionClient};
pub use types::{Sport, Visibility};
pub use update::{BulkUpdater, UpdatePayload};

#[derive(Debug, Error)]
pub enum StravaError {
    #[error("http error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("CSRF token not found on login page")]
    TokenNotFound,
    #[error("login failed (status {0})")]
    AuthenticationFailed(u16),
    #[error("incorrect Strava login credentials or expired session")]
    UnauthorizedSession,
    #[error("request to {url:?} returned status code {status}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("could not decode activity listing: {0}")]
    Decode(String),
    #[error(
        "activity {activity_id} starts after the activity listed before it; refusing to rely on listing order"
    )]
    UnsortedListing { activity_id: i64 },
    #[error(
        "update of activity {activity_id} (record {index}) failed after {completed} successful updates"
    )]
    UpdateAborted {
        index: usize,
        activity_id: i64,
        completed: usize,
        #[source]
        source: Box<StravaError>,
    },
    #[error("{0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
}

/// One activity as returned by the training-activities listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityRecord {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub commute: bool,
    pub sport: String,
    pub visibility: String,
}

/// One decoded page of the listing.
#[derive(Clone, Debug, PartialEq)]
pub struct PageResult {
    pub records: Vec<ActivityRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
}

impl PageResult {
    /// Whether the server reports records beyond this page.
    pub fn has_more(&self) -> bool {
        if self.per_page == 0 {
            return false;
        }
        i64::from(self.total) - i64::from(self.page) * i64::from(self.per_page) > 0
    }
}

/// The two remote operations enumeration and bulk update are built on.
#[async_trait]
pub trait TrainingLog: Send + Sync {
    /// Fetch and decode page `page` (1-based) of the activity listing.
    async fn fetch_page(&self, page: u32) -> Result<PageResult, StravaError>;

    /// Send `payload` as the new state of activity `activity_id`.
    async fn update_activity(
        &self,
        activity_id: i64,
        payload: &UpdatePayload,
    ) -> Result<(), StravaError>;
}

/// Log in, collect the activities in `range` and apply `payload` to each.
///
/// Returns the number of activities updated.
pub async fn run_bulk_edit(
    config: &Config,
    credentials: &Credentials,
    range: DateRange,
    payload: &UpdatePayload,
) -> Result<usize, StravaError> {
    let client = SessionClient::new(&config.base_url)?;
    let token = Authenticator::new(&client)
        .authenticate(&credentials.email, &credentials.password)
        .await?;
    let session = AuthenticatedSession::new(client, token);

    let records = ActivityEnumerator::new(&session).enumerate(range).await?;
    BulkUpdater::new(&session).apply(&records, payload).await
}
