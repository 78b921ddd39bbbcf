use std::collections::BTreeMap;

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;

use crate::{
    config::RemoteConfig,
    error::{SyncError, SyncStage},
    models::ResultRecord,
};

use super::firestore::{merge_session, Document, DocumentField, DocumentWrite};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const DATABASE: &str = "(default)";

/// Outcome of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReceipt {
    pub session_key: String,
    /// Entries in the document after the write, including this one.
    pub field_count: usize,
    /// The document did not exist before this write.
    pub created: bool,
}

/// Remote state observed by the fetch leg.
#[derive(Debug, Default)]
struct Snapshot {
    fields: BTreeMap<String, Value>,
    update_time: Option<String>,
    exists: bool,
}

/// Read-modify-write client for `{collection}/{user_id}` documents.
///
/// Each `sync` is attempted at most once. Without conditional writes two
/// devices syncing the same user concurrently can lose one session.
#[derive(Debug, Clone)]
pub struct RemoteSync {
    client: Client,
    config: RemoteConfig,
}

impl RemoteSync {
    pub fn new(config: RemoteConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .map_err(SyncError::Client)?;

        Ok(Self { client, config })
    }

    /// Adds `record` under `session_key` to the user's document.
    ///
    /// Every entry already in the document is written back unchanged.
    pub async fn sync(
        &self,
        user_id: &str,
        record: &ResultRecord,
        session_key: &str,
    ) -> Result<SyncReceipt, SyncError> {
        if !self.config.is_configured() {
            return Err(SyncError::NotConfigured);
        }

        let snapshot = self.fetch(user_id).await?;
        log_debug!(
            "fetched {} existing field(s) for {}",
            snapshot.fields.len(),
            user_id
        );

        let created = !snapshot.exists;
        let merged = merge_session(snapshot.fields, session_key, record);
        let field_count = merged.len();

        let precondition = self.precondition(snapshot.exists, snapshot.update_time.as_deref());
        self.write(user_id, &merged, precondition).await?;

        log_info!("Data successfully uploaded for {} ({})", user_id, session_key);
        Ok(SyncReceipt {
            session_key: session_key.to_string(),
            field_count,
            created,
        })
    }

    async fn fetch(&self, user_id: &str) -> Result<Snapshot, SyncError> {
        let url = self.document_url(user_id, None)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                stage: SyncStage::Fetch,
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Snapshot::default());
        }

        let body = response.text().await.map_err(|source| SyncError::Transport {
            stage: SyncStage::Fetch,
            source,
        })?;

        if status != StatusCode::OK {
            return Err(SyncError::Status {
                stage: SyncStage::Fetch,
                status: status.as_u16(),
                body,
            });
        }

        let document: Document = serde_json::from_str(&body)
            .map_err(|err| SyncError::MalformedResponse(err.to_string()))?;

        Ok(Snapshot {
            fields: document.fields,
            update_time: document.update_time,
            exists: true,
        })
    }

    async fn write(
        &self,
        user_id: &str,
        fields: &BTreeMap<String, DocumentField>,
        precondition: Option<(&'static str, String)>,
    ) -> Result<(), SyncError> {
        let url = self.document_url(user_id, precondition)?;
        let response = self
            .client
            .patch(url)
            .json(&DocumentWrite { fields })
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                stage: SyncStage::Write,
                source,
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if self.config.conditional_writes && is_precondition_failure(status, &body) {
            return Err(SyncError::Conflict {
                status: status.as_u16(),
                body,
            });
        }

        Err(SyncError::Status {
            stage: SyncStage::Write,
            status: status.as_u16(),
            body,
        })
    }

    fn precondition(
        &self,
        exists: bool,
        update_time: Option<&str>,
    ) -> Option<(&'static str, String)> {
        if !self.config.conditional_writes {
            return None;
        }
        match (exists, update_time) {
            (true, Some(update_time)) => {
                Some(("currentDocument.updateTime", update_time.to_string()))
            }
            (true, None) => None,
            (false, _) => Some(("currentDocument.exists", "false".to_string())),
        }
    }

    fn document_url(
        &self,
        user_id: &str,
        precondition: Option<(&'static str, String)>,
    ) -> Result<Url, SyncError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|err| SyncError::InvalidUrl(format!("{}: {err}", self.config.base_url)))?;

        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "projects",
                self.config.project_id.as_str(),
                "databases",
                DATABASE,
                "documents",
                self.config.collection.as_str(),
                user_id,
            ]);

        {
            let mut query = url.query_pairs_mut();
            if !self.config.api_key.is_empty() {
                query.append_pair("key", &self.config.api_key);
            }
            if let Some((name, value)) = precondition {
                query.append_pair(name, &value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }
}

fn is_precondition_failure(status: StatusCode, body: &str) -> bool {
    status == StatusCode::CONFLICT
        || (status == StatusCode::BAD_REQUEST && body.contains("FAILED_PRECONDITION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{
        firestore::decode_record,
        testing::{FakeFirestore, Reply},
    };
    use serde_json::json;
    use std::time::Duration;

    const USER: &str = "player@example.com";
    const KEY: &str = "score-2026-10-19T14_02_11";

    fn record() -> ResultRecord {
        ResultRecord {
            timestamp: "2026-10-19T14_02_11".into(),
            hit_count: 3,
            miss_count: 1,
            min_ms: Some(120),
            max_ms: Some(340),
            avg_ms: Some(220.0),
            score: 0.75,
        }
    }

    fn ok() -> Reply {
        Reply::Status(200, "{}".into())
    }

    #[tokio::test]
    async fn missing_document_is_created_with_one_session() {
        let server = FakeFirestore::start(vec![Reply::Status(404, "{}".into()), ok()]);
        let remote = RemoteSync::new(server.config()).unwrap();

        let receipt = remote.sync(USER, &record(), KEY).await.unwrap();

        assert!(receipt.created);
        assert_eq!(receipt.field_count, 1);

        let requests = server.finish();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");
        assert!(requests[0]
            .url
            .starts_with("/v1/projects/demo/databases/(default)/documents/game_results/player@example.com"));
        assert!(requests[0].url.contains("key=test-key"));

        assert_eq!(requests[1].method, "PATCH");
        assert!(requests[1].url.contains("currentDocument.exists=false"));
        let fields = requests[1].json()["fields"].as_object().unwrap().clone();
        assert_eq!(fields.len(), 1);
        assert_eq!(decode_record(&fields[KEY]), Some(record()));
    }

    #[tokio::test]
    async fn existing_sessions_survive_the_merge() {
        let prior = json!({"mapValue": {"fields": {
            "avg_response_time": {"doubleValue": 180.5},
            "score": {"doubleValue": 0.9},
            "min_response_time": {"integerValue": "150"},
            "max_response_time": {"integerValue": "230"},
            "timestamp": {"stringValue": "2026-10-01T08_00_00"}
        }}});
        let foreign = json!({"arrayValue": {"values": [{"booleanValue": true}]}});
        let existing = json!({
            "name": "projects/demo/databases/(default)/documents/game_results/player@example.com",
            "fields": {"score-2026-10-01T08_00_00": prior.clone(), "settings": foreign.clone()},
            "createTime": "2026-10-01T08:00:01.000000Z",
            "updateTime": "2026-10-01T08:00:01.000000Z"
        });
        let server = FakeFirestore::start(vec![Reply::Status(200, existing.to_string()), ok()]);
        let remote = RemoteSync::new(server.config()).unwrap();

        let receipt = remote.sync(USER, &record(), KEY).await.unwrap();

        assert!(!receipt.created);
        assert_eq!(receipt.field_count, 3);

        let requests = server.finish();
        let patch = &requests[1];
        assert!(patch
            .url
            .contains("currentDocument.updateTime=2026-10-01T08%3A00%3A01.000000Z"));
        let fields = &patch.json()["fields"];
        assert_eq!(fields["score-2026-10-01T08_00_00"], prior);
        assert_eq!(fields["settings"], foreign);
        assert_eq!(decode_record(&fields[KEY]), Some(record()));
    }

    #[tokio::test]
    async fn write_failure_is_reported_with_status() {
        let server = FakeFirestore::start(vec![
            Reply::Status(404, "{}".into()),
            Reply::Status(500, "backend exploded".into()),
        ]);
        let remote = RemoteSync::new(server.config()).unwrap();

        let err = remote.sync(USER, &record(), KEY).await.unwrap_err();

        match err {
            SyncError::Status {
                stage,
                status,
                ref body,
            } => {
                assert_eq!(stage, SyncStage::Write);
                assert_eq!(status, 500);
                assert_eq!(body, "backend exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(server.finish().len(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_skips_the_write() {
        let server = FakeFirestore::start(vec![Reply::Status(403, "denied".into())]);
        let remote = RemoteSync::new(server.config()).unwrap();

        let err = remote.sync(USER, &record(), KEY).await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::Status {
                stage: SyncStage::Fetch,
                status: 403,
                ..
            }
        ));
        assert_eq!(err.status(), Some(403));
        assert_eq!(server.finish().len(), 1);
    }

    #[tokio::test]
    async fn malformed_document_skips_the_write() {
        let server = FakeFirestore::start(vec![Reply::Status(200, r#"{"fields": 7}"#.into())]);
        let remote = RemoteSync::new(server.config()).unwrap();

        let err = remote.sync(USER, &record(), KEY).await.unwrap_err();

        assert!(matches!(err, SyncError::MalformedResponse(_)));
        assert_eq!(server.finish().len(), 1);
    }

    #[tokio::test]
    async fn rejected_precondition_is_a_conflict() {
        let server = FakeFirestore::start(vec![
            Reply::Status(
                200,
                json!({"fields": {}, "updateTime": "2026-10-01T08:00:01Z"}).to_string(),
            ),
            Reply::Status(
                400,
                json!({"error": {"code": 400, "status": "FAILED_PRECONDITION"}}).to_string(),
            ),
        ]);
        let remote = RemoteSync::new(server.config()).unwrap();

        let err = remote.sync(USER, &record(), KEY).await.unwrap_err();

        assert!(matches!(err, SyncError::Conflict { status: 400, .. }));
        server.finish();
    }

    #[tokio::test]
    async fn unconditional_writes_carry_no_precondition() {
        let server = FakeFirestore::start(vec![Reply::Status(404, "{}".into()), ok()]);
        let config = RemoteConfig {
            conditional_writes: false,
            ..server.config()
        };
        let remote = RemoteSync::new(config).unwrap();

        remote.sync(USER, &record(), KEY).await.unwrap();

        let requests = server.finish();
        assert!(!requests[1].url.contains("currentDocument"));
    }

    #[tokio::test]
    async fn unresponsive_store_times_out() {
        let server = FakeFirestore::start(vec![Reply::Stall(Duration::from_millis(1_500))]);
        let config = RemoteConfig {
            timeout_ms: 200,
            ..server.config()
        };
        let remote = RemoteSync::new(config).unwrap();

        let err = remote.sync(USER, &record(), KEY).await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::Transport {
                stage: SyncStage::Fetch,
                ..
            }
        ));
        server.finish();
    }

    #[tokio::test]
    async fn unconfigured_remote_fails_without_network() {
        let remote = RemoteSync::new(RemoteConfig::default()).unwrap();

        let err = remote.sync(USER, &record(), KEY).await.unwrap_err();

        assert!(matches!(err, SyncError::NotConfigured));
    }

    #[test]
    fn document_url_escapes_user_id() {
        let remote = RemoteSync::new(RemoteConfig {
            project_id: "demo".into(),
            api_key: String::new(),
            ..RemoteConfig::default()
        })
        .unwrap();

        let url = remote.document_url("a b/c@example.com", None).unwrap();

        assert_eq!(
            url.as_str(),
            "https://firestore.googleapis.com/v1/projects/demo/databases/(default)/documents/game_results/a%20b%2Fc@example.com"
        );
    }
}
