use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    #[serde(with = "ttl_secs")]
    pub ttl: Duration,
}

impl Notice {
    pub fn info(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
            ttl,
        }
    }

    pub fn success(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
            ttl,
        }
    }

    pub fn error(text: impl Into<String>, ttl: Duration) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
            ttl,
        }
    }
}

mod ttl_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }
}

/// Where notices are shown.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice) -> Result<()>;
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, notice: Notice) -> Result<()> {
        match notice.level {
            NoticeLevel::Error => tracing::warn!(text = %notice.text, "Notice"),
            _ => tracing::info!(level = ?notice.level, text = %notice.text, "Notice"),
        }
        Ok(())
    }
}

/// Forwards notices to a UI task over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotices {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotices {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NoticeSink for ChannelNotices {
    fn notify(&self, notice: Notice) -> Result<()> {
        self.tx.send(notice).map_err(|_| ClientError::NoticeClosed)
    }
}

pub fn emit_notice<N: NoticeSink + ?Sized>(sink: &N, notice: Notice) {
    if let Err(e) = sink.notify(notice) {
        tracing::error!(error = %e, "Failed to surface notice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notices_forward() {
        let (sink, mut rx) = ChannelNotices::new();
        emit_notice(&sink, Notice::success("Saved", Duration::from_secs(3)));
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.text, "Saved");
    }

    #[test]
    fn test_closed_channel_reports_error() {
        let (sink, rx) = ChannelNotices::new();
        drop(rx);
        assert!(matches!(
            sink.notify(Notice::info("x", Duration::ZERO)),
            Err(ClientError::NoticeClosed)
        ));
    }

    #[test]
    fn test_notice_serializes_ttl_as_seconds() {
        let json = serde_json::to_value(Notice::error("Send failed", Duration::from_secs(5))).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["ttl"], 5);
    }
}
