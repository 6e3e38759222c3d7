//! Walking the training-activities listing.
//!
//! The listing is sorted by start time, most recent first. Enumeration relies
//! on that: the first record older than the lower bound ends the whole walk,
//! and no later page is requested. A record newer than its predecessor means
//! the ordering assumption is broken, and enumeration stops with
//! [`StravaError::UnsortedListing`] instead of silently missing activities.

use crate::{ActivityRecord, PageResult, StravaError, TrainingLog};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info};

/// Timestamp format used by `start_time` in the listing, e.g. `2023-01-15T08:30:00+0000`.
pub const LISTING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    models: Vec<ActivityModel>,
    page: u32,
    #[serde(rename = "perPage")]
    per_page: u32,
    total: u32,
}

#[derive(Debug, Deserialize)]
struct ActivityModel {
    start_time: String,
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    commute: bool,
    #[serde(default, rename = "type")]
    sport: Option<String>,
    #[serde(default)]
    visibility: Option<String>,
}

impl TryFrom<ActivityModel> for ActivityRecord {
    type Error = StravaError;

    fn try_from(m: ActivityModel) -> Result<Self, Self::Error> {
        Ok(ActivityRecord {
            start_time: parse_start_time(&m.start_time)?,
            id: m.id,
            title: m.name.unwrap_or_default(),
            description: m.description.unwrap_or_default(),
            commute: m.commute,
            sport: m.sport.unwrap_or_default(),
            visibility: m.visibility.unwrap_or_default(),
        })
    }
}

/// Parse a listing timestamp. RFC 3339 is accepted as well.
pub fn parse_start_time(s: &str) -> Result<DateTime<Utc>, StravaError> {
    DateTime::parse_from_str(s, LISTING_TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StravaError::Decode(format!("invalid start_time {s:?}: {e}")))
}

/// Decode one JSON listing page.
pub fn decode_page(body: &[u8]) -> Result<PageResult, StravaError> {
    let listing: ListingResponse =
        serde_json::from_slice(body).map_err(|e| StravaError::Decode(e.to_string()))?;
    let records = listing
        .models
        .into_iter()
        .map(ActivityRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PageResult {
        records,
        page: listing.page,
        per_page: listing.per_page,
        total: listing.total,
    })
}

/// Half-open window `[from, to)` on activity start time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, StravaError> {
        if from > to {
            return Err(StravaError::Validation(
                "Start date must be before end date".into(),
            ));
        }
        Ok(Self { from, to })
    }

    /// Window from calendar dates, both taken at midnight UTC.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Result<Self, StravaError> {
        Self::new(midnight(from), midnight(to))
    }

    /// Bounds wide enough to cover every activity.
    pub fn all() -> Self {
        Self {
            from: midnight(Self::earliest()),
            to: midnight(Self::latest()),
        }
    }

    pub fn earliest() -> NaiveDate {
        NaiveDate::from_ymd_opt(0, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn latest() -> NaiveDate {
        NaiveDate::from_ymd_opt(9999, 1, 1).unwrap_or(NaiveDate::MAX)
    }

    /// The record is older than the window; everything after it is too.
    pub fn is_before(&self, t: DateTime<Utc>) -> bool {
        t < self.from
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.from && t < self.to
    }
}

fn midnight(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(chrono::NaiveTime::MIN).and_utc()
}

pub struct ActivityEnumerator<'a, L: TrainingLog + ?Sized> {
    log: &'a L,
}

impl<'a, L: TrainingLog + ?Sized> ActivityEnumerator<'a, L> {
    pub fn new(log: &'a L) -> Self {
        Self { log }
    }

    /// Collect the activities that started within `range`, most recent first.
    pub async fn enumerate(&self, range: DateRange) -> Result<Vec<ActivityRecord>, StravaError> {
        info!("Fetching activity list...");
        let mut selected = Vec::new();
        let mut previous: Option<DateTime<Utc>> = None;
        let mut page = 1u32;

        loop {
            let result = self.log.fetch_page(page).await?;
            debug!(
                page = result.page,
                per_page = result.per_page,
                total = result.total,
                records = result.records.len(),
                "decoded listing page"
            );
            let has_more = result.has_more();

            for record in result.records {
                if previous.is_some_and(|p| record.start_time > p) {
                    return Err(StravaError::UnsortedListing {
                        activity_id: record.id,
                    });
                }
                previous = Some(record.start_time);

                if range.is_before(record.start_time) {
                    debug!(id = record.id, "reached activities older than range");
                    info!("Found {} matching activities", selected.len());
                    return Ok(selected);
                }
                if range.contains(record.start_time) {
                    selected.push(record);
                } else {
                    debug!(id = record.id, "skipping activity newer than range");
                }
            }

            if !has_more {
                break;
            }
            page += 1;
        }

        info!("Found {} matching activities", selected.len());
        Ok(selected)
    }
}
