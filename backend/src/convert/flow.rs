//! Conversion flow controller
//!
//! Drives a single conversion attempt from submission to a terminal state
//! and keeps it observable. The flow owns the one current-attempt slot;
//! presentation reads snapshots and subscribes to updates, it never writes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::ConversionOption;
use crate::convert::attempt::{AttemptStatus, AttemptUpdate, AttemptView, ConversionAttempt};
use crate::convert::client::{ConvertClient, OutputFile};
use crate::convert::error::ConvertError;

/// Delay before an attempt is advanced from `uploading` to `converting`.
///
/// Cosmetic feedback only, not a measurement of the real transfer. The tick
/// applies solely while the attempt is still `uploading`, so a real result
/// that arrives first always wins.
const COSMETIC_ADVANCE_DELAY: Duration = Duration::from_millis(500);

/// How long the success notice stays up before clearing itself
const NOTICE_CLEAR_DELAY: Duration = Duration::from_secs(3);

const FALLBACK_ERROR_MESSAGE: &str = "failed to convert the file";
const SUCCESS_NOTICE: &str = "Conversion completed!";

/// Inner state that cannot be cloned directly
struct FlowInner {
    /// The single tracked attempt; starting a new one replaces it
    current: RwLock<Option<ConversionAttempt>>,
}

/// Controller for the app's one in-flight conversion attempt
#[derive(Clone)]
pub struct ConversionFlow {
    client: ConvertClient,

    /// Inner state wrapped in Arc
    inner: Arc<FlowInner>,

    /// Broadcast channel for attempt updates
    update_tx: broadcast::Sender<AttemptUpdate>,
}

impl ConversionFlow {
    pub fn new(client: ConvertClient) -> Self {
        let (update_tx, _) = broadcast::channel(1000);

        Self {
            client,
            inner: Arc::new(FlowInner {
                current: RwLock::new(None),
            }),
            update_tx,
        }
    }

    /// Subscribe to attempt updates
    pub fn subscribe(&self) -> broadcast::Receiver<AttemptUpdate> {
        self.update_tx.subscribe()
    }

    /// Read-only snapshot of the current attempt
    pub fn current(&self) -> Option<AttemptView> {
        self.inner.current.read().as_ref().map(AttemptView::from)
    }

    /// Start a fresh attempt for `file_name`, replacing any tracked one.
    ///
    /// A prior attempt's network call is not aborted; its id no longer
    /// matches the slot, so its eventual completion is discarded.
    pub fn start(&self, file_name: String, bytes: Vec<u8>, option: &ConversionOption) -> Uuid {
        let from_format = option.from_format.to_string();
        let to_format = option.to_format.to_string();
        let id = self.begin(file_name.clone(), from_format.clone(), to_format.clone());

        info!(
            "Starting conversion {}: {} ({} -> {})",
            id, file_name, from_format, to_format
        );

        let flow = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COSMETIC_ADVANCE_DELAY).await;
            flow.advance_cosmetic(id);
        });

        let flow = self.clone();
        tokio::spawn(async move {
            let result = flow
                .client
                .convert(&from_format, &to_format, &file_name, &bytes)
                .await;

            match result {
                Ok(response) => flow.complete(id, response.files),
                Err(e) => flow.fail(id, e),
            }
        });

        id
    }

    /// Clear the tracked attempt; any in-flight task for it becomes stale
    pub fn dismiss(&self) {
        let dismissed = self.inner.current.write().take();

        if let Some(attempt) = dismissed {
            info!("Dismissed conversion {}", attempt.id);
            self.publish(AttemptUpdate::Dismissed { id: attempt.id });
        }
    }

    /// Install a new uploading attempt into the slot
    fn begin(&self, file_name: String, from_format: String, to_format: String) -> Uuid {
        let attempt = ConversionAttempt::new(file_name, from_format, to_format);
        let id = attempt.id;
        let view = attempt.view();

        *self.inner.current.write() = Some(attempt);
        self.publish(AttemptUpdate::Changed { attempt: view });

        id
    }

    /// Advance `uploading` to `converting` after the cosmetic delay.
    ///
    /// A no-op unless the slot still holds this attempt in `uploading`
    /// state; a real completion is never overwritten.
    fn advance_cosmetic(&self, id: Uuid) {
        let view = {
            let mut current = self.inner.current.write();
            match current.as_mut() {
                Some(attempt)
                    if attempt.id == id && attempt.status == AttemptStatus::Uploading =>
                {
                    attempt.status = AttemptStatus::Converting;
                    attempt.view()
                }
                _ => return,
            }
        };

        self.publish(AttemptUpdate::Changed { attempt: view });
    }

    /// Terminal transition on a successful service response
    fn complete(&self, id: Uuid, files: Vec<OutputFile>) {
        let download_url = match files.first().and_then(download_url_for) {
            Some(url) => url,
            None => return self.fail(id, ConvertError::EmptyResult),
        };

        let view = {
            let mut current = self.inner.current.write();
            match current.as_mut() {
                Some(attempt) if attempt.id == id && !attempt.status.is_terminal() => {
                    attempt.status = AttemptStatus::Completed { download_url };
                    attempt.view()
                }
                _ => {
                    debug!("Discarding stale completion for attempt {}", id);
                    return;
                }
            }
        };

        info!("Conversion {} completed", id);
        self.publish(AttemptUpdate::Changed { attempt: view });
        self.publish(AttemptUpdate::Notice {
            id,
            message: SUCCESS_NOTICE.to_string(),
        });

        let flow = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(NOTICE_CLEAR_DELAY).await;
            flow.publish(AttemptUpdate::NoticeCleared { id });
        });
    }

    /// Terminal transition on a failed service call
    fn fail(&self, id: Uuid, error: ConvertError) {
        let message = match error.to_string() {
            m if m.trim().is_empty() => FALLBACK_ERROR_MESSAGE.to_string(),
            m => m,
        };

        let view = {
            let mut current = self.inner.current.write();
            match current.as_mut() {
                Some(attempt) if attempt.id == id && !attempt.status.is_terminal() => {
                    attempt.status = AttemptStatus::Error { message };
                    attempt.view()
                }
                _ => {
                    debug!("Discarding stale failure for attempt {}", id);
                    return;
                }
            }
        };

        info!(
            "Conversion {} failed: {}",
            id,
            view.error_message.as_deref().unwrap_or_default()
        );
        self.publish(AttemptUpdate::Changed { attempt: view });
    }

    fn publish(&self, update: AttemptUpdate) {
        let _ = self.update_tx.send(update);
    }
}

/// Pick the link clients download from: the service's retrieval URL when
/// present, otherwise a data URL synthesized from the inline payload
fn download_url_for(file: &OutputFile) -> Option<String> {
    if let Some(url) = &file.url {
        return Some(url.clone());
    }

    file.file_data.as_ref().map(|data| {
        let mime = mime_guess::from_ext(&file.file_ext).first_or_octet_stream();
        format!("data:{};base64,{}", mime.essence_str(), data)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::config::ConvertApiSettings;
    use url::Url;

    fn test_flow() -> ConversionFlow {
        ConversionFlow::new(ConvertClient::new(&ConvertApiSettings::default()).unwrap())
    }

    fn test_flow_with_base(base: &str) -> ConversionFlow {
        let settings = ConvertApiSettings {
            base_url: Url::parse(base).unwrap(),
            token: "secret".to_string(),
        };
        ConversionFlow::new(ConvertClient::new(&settings).unwrap())
    }

    fn output_file(url: Option<&str>, data: Option<&str>) -> OutputFile {
        OutputFile {
            file_name: "report.pdf".to_string(),
            file_ext: "pdf".to_string(),
            file_size: 1024,
            file_data: data.map(str::to_string),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn begin_tracks_an_uploading_attempt() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());

        let view = flow.current().unwrap();
        assert_eq!(view.id, id);
        assert_eq!(view.file_name, "report.docx");
        assert_eq!(view.from_format, "docx");
        assert_eq!(view.to_format, "pdf");
        assert_eq!(view.status, "uploading");
        assert_eq!(view.progress, 30);
    }

    #[test]
    fn cosmetic_tick_advances_an_uploading_attempt() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());

        flow.advance_cosmetic(id);

        let view = flow.current().unwrap();
        assert_eq!(view.status, "converting");
        assert_eq!(view.progress, 70);
    }

    #[tokio::test]
    async fn completion_sets_url_and_full_progress() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());
        flow.advance_cosmetic(id);

        flow.complete(id, vec![output_file(Some("https://cdn/x.pdf"), None)]);

        let view = flow.current().unwrap();
        assert_eq!(view.status, "completed");
        assert_eq!(view.progress, 100);
        assert_eq!(view.download_url.as_deref(), Some("https://cdn/x.pdf"));
        assert!(view.error_message.is_none());
    }

    #[tokio::test]
    async fn completion_can_win_the_race_against_the_cosmetic_tick() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());

        // Real result lands while the attempt is still uploading
        flow.complete(id, vec![output_file(Some("https://cdn/x.pdf"), None)]);
        let view = flow.current().unwrap();
        assert_eq!(view.status, "completed");

        // The late tick must not claw the attempt back to converting
        flow.advance_cosmetic(id);
        let view = flow.current().unwrap();
        assert_eq!(view.status, "completed");
        assert_eq!(view.progress, 100);
    }

    #[test]
    fn failure_carries_the_service_message() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());

        flow.fail(
            id,
            ConvertError::Api {
                status: 402,
                message: "quota exceeded".to_string(),
            },
        );

        let view = flow.current().unwrap();
        assert_eq!(view.status, "error");
        assert_eq!(view.progress, 0);
        assert!(view.error_message.unwrap().contains("quota exceeded"));
        assert!(view.download_url.is_none());
    }

    #[tokio::test]
    async fn empty_file_list_surfaces_as_an_error() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());

        flow.complete(id, vec![]);

        let view = flow.current().unwrap();
        assert_eq!(view.status, "error");
        assert!(view.error_message.unwrap().contains("no output file"));
    }

    #[tokio::test]
    async fn inline_payloads_become_data_urls() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());

        flow.complete(id, vec![output_file(None, Some("aGVsbG8="))]);

        let view = flow.current().unwrap();
        assert_eq!(view.status, "completed");
        assert_eq!(
            view.download_url.as_deref(),
            Some("data:application/pdf;base64,aGVsbG8=")
        );
    }

    #[tokio::test]
    async fn stale_completion_does_not_touch_a_newer_attempt() {
        let flow = test_flow();
        let old_id = flow.begin("old.docx".into(), "docx".into(), "pdf".into());
        let new_id = flow.begin("new.docx".into(), "docx".into(), "pdf".into());

        flow.complete(old_id, vec![output_file(Some("https://cdn/old.pdf"), None)]);

        let view = flow.current().unwrap();
        assert_eq!(view.id, new_id);
        assert_eq!(view.file_name, "new.docx");
        assert_eq!(view.status, "uploading");
        assert!(view.download_url.is_none());
    }

    #[test]
    fn stale_failure_does_not_touch_a_newer_attempt() {
        let flow = test_flow();
        let old_id = flow.begin("old.docx".into(), "docx".into(), "pdf".into());
        let new_id = flow.begin("new.docx".into(), "docx".into(), "pdf".into());

        flow.fail(
            old_id,
            ConvertError::Api {
                status: 500,
                message: "late failure".to_string(),
            },
        );

        let view = flow.current().unwrap();
        assert_eq!(view.id, new_id);
        assert_eq!(view.status, "uploading");
    }

    #[tokio::test]
    async fn dismiss_clears_the_slot_and_invalidates_in_flight_work() {
        let flow = test_flow();
        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());

        flow.dismiss();
        assert!(flow.current().is_none());

        // The outstanding completion is now stale
        flow.complete(id, vec![output_file(Some("https://cdn/x.pdf"), None)]);
        assert!(flow.current().is_none());

        // A fresh attempt is unaffected by the previous one
        flow.begin("next.xlsx".into(), "xlsx".into(), "pdf".into());
        let view = flow.current().unwrap();
        assert_eq!(view.file_name, "next.xlsx");
        assert_eq!(view.status, "uploading");
    }

    #[tokio::test]
    async fn updates_are_broadcast_to_subscribers() {
        let flow = test_flow();
        let mut rx = flow.subscribe();

        let id = flow.begin("report.docx".into(), "docx".into(), "pdf".into());
        flow.complete(id, vec![output_file(Some("https://cdn/x.pdf"), None)]);
        flow.dismiss();

        match rx.recv().await.unwrap() {
            AttemptUpdate::Changed { attempt } => assert_eq!(attempt.status, "uploading"),
            other => panic!("unexpected update: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            AttemptUpdate::Changed { attempt } => assert_eq!(attempt.status, "completed"),
            other => panic!("unexpected update: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            AttemptUpdate::Notice { message, .. } => assert!(message.contains("completed")),
            other => panic!("unexpected update: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            AttemptUpdate::Dismissed { id: dismissed } => assert_eq!(dismissed, id),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn start_drives_an_unreachable_service_to_an_error_state() {
        // Nothing listens on this port, so the real call fails fast and the
        // spawned task must land the attempt in the error state.
        let flow = test_flow_with_base("http://127.0.0.1:9/");
        let option = catalog::find_option("docx-to-pdf").unwrap();

        let id = flow.start("report.docx".to_string(), b"content".to_vec(), option);
        assert_eq!(flow.current().unwrap().id, id);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let view = flow.current().unwrap();
            if view.status == "error" {
                assert_eq!(view.progress, 0);
                assert!(view.error_message.is_some());
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "attempt never reached a terminal state"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
