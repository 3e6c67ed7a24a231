//! Transient notification banners.
//!
//! `show` appends a `.message` banner to the `.messages` container and
//! schedules one fire-and-forget timer. When the timer fires it fades out
//! the *first* message currently on the page, which is not necessarily the
//! one that scheduled it: with several banners up, they leave oldest-first
//! regardless of which were dismissed by hand in between.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::dom::{self, DomError, NodeId, SharedDocument};
use crate::page::classes;

const NOTIFICATION_ID_ATTR: &str = "data-notification-id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    /// Caller-supplied tag, used verbatim as the CSS class.
    Other(String),
}

impl NotificationKind {
    pub fn as_class(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(tag: &str) -> Self {
        match tag {
            "info" => Self::Info,
            "success" => Self::Success,
            "warning" => Self::Warning,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A banner that was put on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub node: NodeId,
    pub message: String,
    pub kind: NotificationKind,
}

/// Snapshot of a banner currently on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleMessage {
    pub message: String,
    pub kind: String,
    pub fading: bool,
}

#[derive(Clone)]
pub struct NotificationCenter {
    doc: SharedDocument,
    delay: Duration,
    fade: Duration,
}

impl NotificationCenter {
    pub fn new(doc: SharedDocument, config: &DashboardConfig) -> Self {
        Self::with_timing(doc, config.notification_delay, config.fade_out)
    }

    pub fn with_timing(doc: SharedDocument, delay: Duration, fade: Duration) -> Self {
        Self { doc, delay, fade }
    }

    /// Append a banner and schedule its auto-dismiss timer.
    ///
    /// Outside a tokio runtime the banner is shown without a timer.
    pub fn show(&self, message: &str, kind: NotificationKind) -> Result<Notification, DomError> {
        let id = Uuid::new_v4();
        let node = {
            let mut doc = dom::lock(&self.doc)?;
            let container = doc.require_class(classes::MESSAGES)?;
            let node = doc.append_new(
                container,
                "div",
                None,
                &[classes::MESSAGE, kind.as_class()],
            )?;
            doc.set_text(node, message)?;
            doc.set_attr(node, NOTIFICATION_ID_ATTR, &id.to_string())?;
            let close = doc.append_new(node, "button", None, &[classes::CLOSE_MESSAGE])?;
            doc.append_new(close, "i", None, &["fas", "fa-times"])?;
            node
        };

        tracing::debug!(notification_id = %id, kind = kind.as_class(), "Notification shown");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let center = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(center.delay).await;
                    if let Err(e) = center.dismiss_first().await {
                        tracing::warn!(error = %e, "Auto-dismiss failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(notification_id = %id, "No runtime, notification will not auto-dismiss");
            }
        }

        Ok(Notification {
            id,
            node,
            message: message.to_string(),
            kind,
        })
    }

    /// Fade out and remove whichever message is first on the page.
    async fn dismiss_first(&self) -> Result<(), DomError> {
        let first = {
            let mut doc = dom::lock(&self.doc)?;
            match doc.first_by_class(classes::MESSAGE) {
                Some(node) => {
                    doc.add_class(node, classes::FADING)?;
                    node
                }
                None => return Ok(()),
            }
        };
        tokio::time::sleep(self.fade).await;
        dom::lock(&self.doc)?.remove(first)
    }

    /// Close-button behaviour: fade out the message containing `target`.
    ///
    /// Returns `false` when `target` is not inside a message.
    pub fn dismiss(&self, target: NodeId) -> Result<bool, DomError> {
        let message = {
            let mut doc = dom::lock(&self.doc)?;
            let Some(message) = doc.closest_with_class(target, classes::MESSAGE) else {
                return Ok(false);
            };
            if doc.get(message)?.has_class(classes::FADING) {
                return Ok(true);
            }
            doc.add_class(message, classes::FADING)?;
            message
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let doc = self.doc.clone();
                let fade = self.fade;
                handle.spawn(async move {
                    tokio::time::sleep(fade).await;
                    if let Err(e) = dom::lock(&doc).and_then(|mut d| d.remove(message)) {
                        tracing::warn!(error = %e, "Removing dismissed message failed");
                    }
                });
            }
            Err(_) => dom::lock(&self.doc)?.remove(message)?,
        }
        Ok(true)
    }

    /// Messages currently attached to the page, in display order.
    pub fn visible(&self) -> Result<Vec<VisibleMessage>, DomError> {
        let doc = dom::lock(&self.doc)?;
        doc.elements_by_class(classes::MESSAGE)
            .into_iter()
            .map(|node| {
                let el = doc.get(node)?;
                let kind = el
                    .classes()
                    .iter()
                    .find(|c| c.as_str() != classes::MESSAGE && c.as_str() != classes::FADING)
                    .cloned()
                    .unwrap_or_default();
                Ok(VisibleMessage {
                    message: el.text.clone(),
                    kind,
                    fading: el.has_class(classes::FADING),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page;

    fn center() -> NotificationCenter {
        let doc = dom::shared(page::donor_dashboard().unwrap());
        NotificationCenter::with_timing(doc, Duration::from_millis(5000), Duration::from_millis(300))
    }

    fn texts(center: &NotificationCenter) -> Vec<String> {
        center.visible().unwrap().into_iter().map(|m| m.message).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn show_appends_banner_with_kind() {
        let center = center();
        let n = center.show("Saved", NotificationKind::Success).unwrap();
        assert_eq!(n.kind, NotificationKind::Success);

        let visible = center.visible().unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].message, "Saved");
        assert_eq!(visible[0].kind, "success");
        assert!(!visible[0].fading);
    }

    #[tokio::test(start_paused = true)]
    async fn banner_has_close_control() {
        let center = center();
        let n = center.show("Hello", NotificationKind::default()).unwrap();
        let doc = dom::lock(&center.doc).unwrap();
        let children = doc.get(n.node).unwrap().children().to_vec();
        assert_eq!(children.len(), 1);
        assert!(doc.get(children[0]).unwrap().has_class(classes::CLOSE_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_after_delay() {
        let center = center();
        center.show("Temporary", NotificationKind::Info).unwrap();

        tokio::time::sleep(Duration::from_millis(4900)).await;
        assert_eq!(texts(&center), vec!["Temporary"]);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(center.visible().unwrap()[0].fading);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(center.visible().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_removes_first_message_not_its_own() {
        let center = center();
        let first = center.show("first", NotificationKind::Info).unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        center.show("second", NotificationKind::Info).unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        center.show("third", NotificationKind::Info).unwrap();

        // Close "first" by hand; its timer is still pending.
        assert!(center.dismiss(first.node).unwrap());
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(texts(&center), vec!["second", "third"]);

        // t=5000: first's timer fires and takes "second".
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(texts(&center), vec!["third"]);

        // t=6000: second's timer takes "third"; t=7000: third's timer finds nothing.
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(texts(&center).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_dedup_or_limit() {
        let center = center();
        for _ in 0..4 {
            center.show("same", NotificationKind::Warning).unwrap();
        }
        assert_eq!(texts(&center).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_from_close_button_fades_then_removes() {
        let center = center();
        let n = center.show("Close me", NotificationKind::Error).unwrap();
        let close = {
            let doc = dom::lock(&center.doc).unwrap();
            doc.get(n.node).unwrap().children()[0]
        };

        assert!(center.dismiss(close).unwrap());
        assert!(center.visible().unwrap()[0].fading);
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(center.visible().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_outside_message_is_noop() {
        let center = center();
        let sidebar = {
            let doc = dom::lock(&center.doc).unwrap();
            doc.require_id(page::ids::SIDEBAR).unwrap()
        };
        assert!(!center.dismiss(sidebar).unwrap());
    }

    #[test]
    fn without_runtime_dismiss_is_immediate() {
        let center = center();
        let n = center.show("No timers", NotificationKind::Info).unwrap();
        assert!(center.dismiss(n.node).unwrap());
        assert!(center.visible().unwrap().is_empty());
    }

    #[test]
    fn missing_container_is_error() {
        let doc = dom::shared(dom::Document::new());
        let center = NotificationCenter::with_timing(doc, Duration::from_secs(5), Duration::ZERO);
        assert!(matches!(
            center.show("x", NotificationKind::Info),
            Err(DomError::MissingElement(_))
        ));
    }

    #[test]
    fn kind_from_tag() {
        assert_eq!(NotificationKind::from("error"), NotificationKind::Error);
        assert_eq!(
            NotificationKind::from("donation"),
            NotificationKind::Other("donation".into())
        );
        assert_eq!(NotificationKind::Other("donation".into()).as_class(), "donation");
    }
}
