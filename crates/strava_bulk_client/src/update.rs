//! Sparse update payloads and the fail-fast bulk update loop.

use crate::types::{Sport, Visibility};
use crate::{ActivityRecord, StravaError, TrainingLog};
use serde::Serialize;
use tracing::{debug, info};

/// The one field a run changes.
///
/// Unset fields are left out of the JSON body entirely; sending them as empty
/// or `false` would clear them on the server. The constructors are the only
/// way to build a payload, so exactly one field is ever set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commute: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    sport: Option<Sport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<Visibility>,
}

impl UpdatePayload {
    fn unset() -> Self {
        Self {
            title: None,
            description: None,
            commute: None,
            sport: None,
            visibility: None,
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::unset()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::unset()
        }
    }

    pub fn commute(commute: bool) -> Self {
        Self {
            commute: Some(commute),
            ..Self::unset()
        }
    }

    pub fn sport(sport: Sport) -> Self {
        Self {
            sport: Some(sport),
            ..Self::unset()
        }
    }

    pub fn visibility(visibility: Visibility) -> Self {
        Self {
            visibility: Some(visibility),
            ..Self::unset()
        }
    }

    /// Wire name of the field this payload changes.
    pub fn field(&self) -> &'static str {
        if self.title.is_some() {
            "name"
        } else if self.description.is_some() {
            "description"
        } else if self.commute.is_some() {
            "commute"
        } else if self.sport.is_some() {
            "type"
        } else {
            "visibility"
        }
    }
}

pub struct BulkUpdater<'a, L: TrainingLog + ?Sized> {
    log: &'a L,
}

impl<'a, L: TrainingLog + ?Sized> BulkUpdater<'a, L> {
    pub fn new(log: &'a L) -> Self {
        Self { log }
    }

    /// PUT `payload` to every record, in order, one request at a time.
    ///
    /// The first failure stops the run; records after it are not touched and
    /// nothing already updated is rolled back. The error carries the 1-based
    /// position of the failing record and how many updates went through.
    pub async fn apply(
        &self,
        records: &[ActivityRecord],
        payload: &UpdatePayload,
    ) -> Result<usize, StravaError> {
        let total = records.len();
        debug!(field = payload.field(), total, "starting bulk update");

        for (i, record) in records.iter().enumerate() {
            if let Err(source) = self.log.update_activity(record.id, payload).await {
                return Err(StravaError::UpdateAborted {
                    index: i + 1,
                    activity_id: record.id,
                    completed: i,
                    source: Box::new(source),
                });
            }
            info!(activity_id = record.id, "Updated {} of {} activities", i + 1, total);
        }

        info!("Finished updating");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageResult;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Mutex;

    /// Accepts updates until `fail_on` (1-based) and records what it was sent.
    struct RecordingLog {
        fail_on: Option<usize>,
        sent: Mutex<Vec<(i64, serde_json::Value)>>,
    }

    impl RecordingLog {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                fail_on,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TrainingLog for RecordingLog {
        async fn fetch_page(&self, _: u32) -> Result<PageResult, StravaError> {
            unreachable!("updates never list")
        }

        async fn update_activity(
            &self,
            activity_id: i64,
            payload: &UpdatePayload,
        ) -> Result<(), StravaError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push((activity_id, serde_json::to_value(payload)?));
            if self.fail_on == Some(sent.len()) {
                return Err(StravaError::UnexpectedStatus {
                    url: format!("/athlete/training_activities/{activity_id}"),
                    status: 422,
                });
            }
            Ok(())
        }
    }

    fn records(n: i64) -> Vec<ActivityRecord> {
        (1..=n)
            .map(|id| ActivityRecord {
                id,
                start_time: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                title: "old".into(),
                description: "keep me".into(),
                commute: true,
                sport: "Ride".into(),
                visibility: "everyone".into(),
            })
            .collect()
    }

    #[test]
    fn payload_serializes_only_the_selected_field() {
        let cases = [
            (UpdatePayload::title("Lunch Ride"), json!({"name": "Lunch Ride"})),
            (UpdatePayload::description(""), json!({"description": ""})),
            (UpdatePayload::commute(false), json!({"commute": false})),
            (UpdatePayload::sport(Sport::Run), json!({"type": "Run"})),
            (
                UpdatePayload::visibility(Visibility::OnlyMe),
                json!({"visibility": "only_me"}),
            ),
        ];
        for (payload, expected) in cases {
            assert_eq!(serde_json::to_value(&payload).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn sends_one_identical_request_per_record() {
        let log = RecordingLog::new(None);
        let payload = UpdatePayload::title("Commute");
        let updater = BulkUpdater::new(&log);
        let n = updater.apply(&records(4), &payload).await.expect("apply");
        assert_eq!(n, 4);

        let first: Vec<_> = log.sent.lock().unwrap().drain(..).collect();
        assert_eq!(first.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        for (_, body) in &first {
            assert_eq!(body, &json!({"name": "Commute"}));
        }

        // Re-applying the same payload produces the same batch.
        let n = updater.apply(&records(4), &payload).await.expect("apply again");
        assert_eq!(n, 4);
        assert_eq!(*log.sent.lock().unwrap(), first);
    }

    #[tokio::test]
    async fn halts_on_first_failure() {
        let log = RecordingLog::new(Some(3));
        let err = BulkUpdater::new(&log)
            .apply(&records(5), &UpdatePayload::commute(true))
            .await
            .unwrap_err();

        assert_eq!(log.sent.lock().unwrap().len(), 3);
        match err {
            StravaError::UpdateAborted {
                index,
                activity_id,
                completed,
                source,
            } => {
                assert_eq!(index, 3);
                assert_eq!(activity_id, 3);
                assert_eq!(completed, 2);
                assert!(matches!(
                    *source,
                    StravaError::UnexpectedStatus { status: 422, .. }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_record_set_is_a_no_op() {
        let log = RecordingLog::new(Some(1));
        let n = BulkUpdater::new(&log)
            .apply(&[], &UpdatePayload::sport(Sport::Walk))
            .await
            .expect("apply");
        assert_eq!(n, 0);
        assert!(log.sent.lock().unwrap().is_empty());
    }
}
