//! Conversion attempt state

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle state of a conversion attempt
///
/// Each variant carries only the data valid for that state: a download URL
/// exists exactly when the attempt completed, an error message exactly when
/// it failed. The flat wire form clients see is produced by [`AttemptView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Uploading,
    Converting,
    Completed { download_url: String },
    Error { message: String },
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Converting => "converting",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }

    /// Displayed progress percentage for this state
    ///
    /// The ramp is cosmetic feedback for the dialog, not a measurement:
    /// 30 while uploading, 70 while converting, 100 on success, 0 on error.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Uploading => 30,
            Self::Converting => 70,
            Self::Completed { .. } => 100,
            Self::Error { .. } => 0,
        }
    }

    /// Whether this state is terminal; no transition leaves a terminal
    /// state except starting a brand-new attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}

/// One user-initiated request to convert a single file, tracked end-to-end
#[derive(Debug, Clone)]
pub struct ConversionAttempt {
    /// Identity tag; asynchronous continuations apply only while their id
    /// still matches the current attempt
    pub id: Uuid,
    pub file_name: String,
    pub from_format: String,
    pub to_format: String,
    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
}

impl ConversionAttempt {
    pub fn new(file_name: String, from_format: String, to_format: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            from_format,
            to_format,
            status: AttemptStatus::Uploading,
            created_at: Utc::now(),
        }
    }

    pub fn view(&self) -> AttemptView {
        AttemptView::from(self)
    }
}

/// Flat attempt snapshot as presented to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptView {
    pub id: Uuid,
    pub file_name: String,
    pub from_format: String,
    pub to_format: String,
    pub status: &'static str,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ConversionAttempt> for AttemptView {
    fn from(attempt: &ConversionAttempt) -> Self {
        let (download_url, error_message) = match &attempt.status {
            AttemptStatus::Completed { download_url } => (Some(download_url.clone()), None),
            AttemptStatus::Error { message } => (None, Some(message.clone())),
            _ => (None, None),
        };

        Self {
            id: attempt.id,
            file_name: attempt.file_name.clone(),
            from_format: attempt.from_format.clone(),
            to_format: attempt.to_format.clone(),
            status: attempt.status.as_str(),
            progress: attempt.status.progress(),
            download_url,
            error_message,
            created_at: attempt.created_at,
        }
    }
}

/// Update pushed to subscribers whenever the attempt slot changes
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AttemptUpdate {
    /// The attempt moved to a new state
    Changed {
        #[serde(flatten)]
        attempt: AttemptView,
    },
    /// Transient confirmation message; clears itself shortly after
    Notice { id: Uuid, message: String },
    NoticeCleared { id: Uuid },
    /// The user dismissed the attempt
    Dismissed { id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_follows_the_status_ramp() {
        assert_eq!(AttemptStatus::Uploading.progress(), 30);
        assert_eq!(AttemptStatus::Converting.progress(), 70);
        assert_eq!(
            AttemptStatus::Completed {
                download_url: "https://cdn/x.pdf".into()
            }
            .progress(),
            100
        );
        assert_eq!(
            AttemptStatus::Error {
                message: "boom".into()
            }
            .progress(),
            0
        );
    }

    #[test]
    fn only_completed_and_error_are_terminal() {
        assert!(!AttemptStatus::Uploading.is_terminal());
        assert!(!AttemptStatus::Converting.is_terminal());
        assert!(AttemptStatus::Completed {
            download_url: "u".into()
        }
        .is_terminal());
        assert!(AttemptStatus::Error {
            message: "m".into()
        }
        .is_terminal());
    }

    #[test]
    fn view_exposes_exactly_the_fields_valid_for_the_state() {
        let mut attempt = ConversionAttempt::new("report.docx".into(), "docx".into(), "pdf".into());

        let view = attempt.view();
        assert_eq!(view.status, "uploading");
        assert_eq!(view.progress, 30);
        assert!(view.download_url.is_none());
        assert!(view.error_message.is_none());

        attempt.status = AttemptStatus::Completed {
            download_url: "https://cdn/x.pdf".into(),
        };
        let view = attempt.view();
        assert_eq!(view.status, "completed");
        assert_eq!(view.download_url.as_deref(), Some("https://cdn/x.pdf"));
        assert!(view.error_message.is_none());

        attempt.status = AttemptStatus::Error {
            message: "quota exceeded".into(),
        };
        let view = attempt.view();
        assert_eq!(view.status, "error");
        assert!(view.download_url.is_none());
        assert_eq!(view.error_message.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn updates_serialize_with_an_event_tag() {
        let attempt = ConversionAttempt::new("a.docx".into(), "docx".into(), "pdf".into());
        let json = serde_json::to_value(AttemptUpdate::Changed {
            attempt: attempt.view(),
        })
        .unwrap();
        assert_eq!(json["event"], "changed");
        assert_eq!(json["status"], "uploading");
        assert_eq!(json["file_name"], "a.docx");

        let json = serde_json::to_value(AttemptUpdate::Dismissed { id: attempt.id }).unwrap();
        assert_eq!(json["event"], "dismissed");
    }
}
