//! Patient panel view-model.
//!
//! `PatientPanelView::render` is a pure function of a validated
//! `PatientDetail`; `apply` writes the result into the page slots. All slots
//! are resolved before the first write, so a page missing one of them is
//! left untouched rather than half-updated.

use serde::Serialize;

use crate::dom::{Document, DomError, NodeId};
use crate::format::{self, DateBadge};
use crate::models::PatientDetail;
use crate::page::{classes, PatientSlots};

pub const NO_TREATMENTS: &str = "No treatments scheduled for this patient.";

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub clamp_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientPanelView {
    pub name: String,
    pub age: String,
    pub condition: String,
    pub progress_width: String,
    pub progress_text: String,
    /// `None` keeps whatever image the page already shows.
    pub photo: Option<String>,
    pub treatments: TreatmentList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "cards", rename_all = "snake_case")]
pub enum TreatmentList {
    Empty,
    Cards(Vec<TreatmentCard>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentCard {
    pub day: u32,
    pub month: String,
    pub name: String,
    pub hospital: String,
    pub cost: String,
}

impl PatientPanelView {
    pub fn render(detail: &PatientDetail, options: RenderOptions) -> Self {
        let progress = if options.clamp_progress {
            detail.treatment_progress.clamp(0.0, 100.0)
        } else {
            detail.treatment_progress
        };

        let treatments = if detail.treatments.is_empty() {
            TreatmentList::Empty
        } else {
            TreatmentList::Cards(
                detail
                    .treatments
                    .iter()
                    .map(|t| {
                        let DateBadge { day, month } = DateBadge::from_date(t.date);
                        TreatmentCard {
                            day,
                            month,
                            name: t.name.clone(),
                            hospital: t.hospital.clone(),
                            cost: format::format_cost(t.estimated_cost),
                        }
                    })
                    .collect(),
            )
        };

        Self {
            name: detail.name.clone(),
            age: detail.age.to_string(),
            condition: detail.condition.clone(),
            progress_width: format::progress_width(progress),
            progress_text: format::progress_text(progress),
            photo: detail.photo.clone(),
            treatments,
        }
    }

    pub fn card_count(&self) -> usize {
        match &self.treatments {
            TreatmentList::Empty => 0,
            TreatmentList::Cards(cards) => cards.len(),
        }
    }

    /// Write the view into the page.
    pub fn apply(&self, doc: &mut Document, slots: &PatientSlots) -> Result<(), DomError> {
        let name = doc.require_id(&slots.name)?;
        let age = doc.require_id(&slots.age)?;
        let condition = doc.require_id(&slots.condition)?;
        let photo = doc.require_id(&slots.photo)?;
        let bar = doc.require_id(&slots.progress_bar)?;
        let bar_text = doc.require_id(&slots.progress_text)?;
        let list = doc.require_id(&slots.treatments)?;

        doc.set_text(name, &self.name)?;
        doc.set_text(age, &self.age)?;
        doc.set_text(condition, &self.condition)?;
        doc.set_style(bar, "width", &self.progress_width)?;
        doc.set_text(bar_text, &self.progress_text)?;
        if let Some(src) = &self.photo {
            doc.set_attr(photo, "src", src)?;
        }

        doc.clear_children(list)?;
        doc.get_mut(list)?.text.clear();
        match &self.treatments {
            TreatmentList::Empty => {
                let p = doc.append_new(list, "p", None, &[classes::NO_DATA])?;
                doc.set_text(p, NO_TREATMENTS)?;
            }
            TreatmentList::Cards(cards) => {
                for card in cards {
                    append_card(doc, list, card)?;
                }
            }
        }
        Ok(())
    }
}

fn append_card(doc: &mut Document, list: NodeId, card: &TreatmentCard) -> Result<(), DomError> {
    let item = doc.append_new(list, "div", None, &[classes::TREATMENT_ITEM])?;

    let date = doc.append_new(item, "div", None, &["treatment-date"])?;
    let day = doc.append_new(date, "span", None, &["date"])?;
    doc.set_text(day, &card.day.to_string())?;
    let month = doc.append_new(date, "span", None, &["month"])?;
    doc.set_text(month, &card.month)?;

    let details = doc.append_new(item, "div", None, &["treatment-details"])?;
    let name = doc.append_new(details, "h4", None, &["treatment-name"])?;
    doc.set_text(name, &card.name)?;
    let hospital = doc.append_new(details, "p", None, &["treatment-hospital"])?;
    doc.append_new(hospital, "i", None, &["fas", "fa-hospital"])?;
    let hospital_name = doc.append_new(hospital, "span", None, &["hospital-name"])?;
    doc.set_text(hospital_name, &card.hospital)?;

    let cost = doc.append_new(item, "div", None, &["treatment-cost"])?;
    let label = doc.append_new(cost, "span", None, &["cost-label"])?;
    doc.set_text(label, "Est. Cost:")?;
    let value = doc.append_new(cost, "span", None, &["cost-value"])?;
    doc.set_text(value, &card.cost)?;
    Ok(())
}
