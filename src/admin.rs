//! Donation change form enhancements.
//!
//! Two field behaviours on the admin form: a changed status select is
//! flagged with the `changed` class, and the amount input is normalised to
//! two decimals when it loses focus.

use std::str::FromStr;

use crate::dom::{self, DomError, NodeId, SharedDocument};
use crate::format::{self, AmountFormat};
use crate::models::DonationStatus;
use crate::page::classes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    Change(NodeId),
    Blur(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// The event target is not an enhanced field.
    Ignored,
    /// Status select flagged; `None` when its value is not a known status.
    StatusChanged(Option<DonationStatus>),
    Amount(AmountFormat),
}

pub struct FieldEnhancer {
    doc: SharedDocument,
}

impl FieldEnhancer {
    pub fn new(doc: SharedDocument) -> Self {
        Self { doc }
    }

    pub fn handle(&self, event: FieldEvent) -> Result<FieldOutcome, DomError> {
        match event {
            FieldEvent::Change(target) => self.status_changed(target),
            FieldEvent::Blur(target) => self.amount_blurred(target),
        }
    }

    fn status_changed(&self, target: NodeId) -> Result<FieldOutcome, DomError> {
        let mut doc = dom::lock(&self.doc)?;
        let el = doc.get(target)?;
        if el.tag != "select" || doc.closest_with_class(target, classes::FIELD_STATUS).is_none() {
            return Ok(FieldOutcome::Ignored);
        }
        let status = DonationStatus::from_str(el.value.as_deref().unwrap_or_default()).ok();
        doc.add_class(target, classes::CHANGED)?;
        tracing::debug!(status = status.map(|s| s.as_str()), "Donation status changed");
        Ok(FieldOutcome::StatusChanged(status))
    }

    fn amount_blurred(&self, target: NodeId) -> Result<FieldOutcome, DomError> {
        let mut doc = dom::lock(&self.doc)?;
        let el = doc.get(target)?;
        if el.tag != "input" || doc.closest_with_class(target, classes::FIELD_AMOUNT).is_none() {
            return Ok(FieldOutcome::Ignored);
        }
        let outcome = format::normalize_amount(el.value.as_deref().unwrap_or_default());
        if let AmountFormat::Formatted(value) = &outcome {
            doc.set_value(target, value)?;
        }
        Ok(FieldOutcome::Amount(outcome))
    }
}
