//! Element ids and classes the dashboard depends on, plus builders for the
//! server-rendered pages they live in.
//!
//! The ids and classes are the integration surface with the page templates;
//! renaming one on either side breaks the matching behaviour.

use crate::dom::{Document, DomError};

pub mod ids {
    pub const PATIENT_NAME: &str = "patient-name";
    pub const PATIENT_AGE: &str = "patient-age";
    pub const PATIENT_CONDITION: &str = "patient-condition";
    pub const PATIENT_PHOTO: &str = "patient-photo";
    pub const TREATMENT_PROGRESS: &str = "treatment-progress";
    pub const PROGRESS_TEXT: &str = "progress-text";
    pub const TREATMENTS_LIST: &str = "treatments-list";
    pub const SIDEBAR: &str = "sidebar";
    pub const SIDEBAR_TOGGLE: &str = "sidebar-toggle";
    pub const COLLAPSE_SIDEBAR: &str = "collapse-sidebar";
}

pub mod classes {
    pub const MESSAGES: &str = "messages";
    pub const MESSAGE: &str = "message";
    pub const CLOSE_MESSAGE: &str = "close-message";
    pub const FADING: &str = "fading";
    pub const MAIN_CONTENT: &str = "main-content";
    pub const SIDEBAR_COLLAPSED: &str = "sidebar-collapsed";
    pub const COLLAPSED: &str = "collapsed";
    pub const USER_PROFILE: &str = "user-profile";
    pub const DROPDOWN_MENU: &str = "dropdown-menu";
    pub const ACTIVE: &str = "active";
    pub const TAB_BTN: &str = "tab-btn";
    pub const TAB_PANE: &str = "tab-pane";
    pub const CHART: &str = "chart";
    pub const FIELD_STATUS: &str = "field-status";
    pub const FIELD_AMOUNT: &str = "field-amount";
    pub const CHANGED: &str = "changed";
    pub const TREATMENT_ITEM: &str = "treatment-item";
    pub const NO_DATA: &str = "no-data";
    pub const PATIENT_DETAILS: &str = "patient-details";
}

/// Attribute naming the pane a tab button shows.
pub const DATA_TAB: &str = "data-tab";
/// Attribute marking tooltip triggers.
pub const TOOLTIP_TOGGLE: &str = "data-bs-toggle";

/// Element ids of the patient panel slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSlots {
    pub name: String,
    pub age: String,
    pub condition: String,
    pub photo: String,
    pub progress_bar: String,
    pub progress_text: String,
    pub treatments: String,
}

impl Default for PatientSlots {
    fn default() -> Self {
        Self {
            name: ids::PATIENT_NAME.into(),
            age: ids::PATIENT_AGE.into(),
            condition: ids::PATIENT_CONDITION.into(),
            photo: ids::PATIENT_PHOTO.into(),
            progress_bar: ids::TREATMENT_PROGRESS.into(),
            progress_text: ids::PROGRESS_TEXT.into(),
            treatments: ids::TREATMENTS_LIST.into(),
        }
    }
}

/// Placeholder image shown until a patient photo loads.
pub const DEFAULT_PHOTO: &str = "/static/img/default-patient.png";

/// The donor dashboard page: sidebar, header with user menu, message
/// container, patient panel, tab group, one chart and a tooltip trigger.
pub fn donor_dashboard() -> Result<Document, DomError> {
    use classes::*;

    let mut doc = Document::new();
    let body = doc.body();

    let sidebar = doc.append_new(body, "nav", Some(ids::SIDEBAR), &["sidebar"])?;
    doc.append_new(sidebar, "button", Some(ids::COLLAPSE_SIDEBAR), &["collapse-btn"])?;

    let main = doc.append_new(body, "div", None, &[MAIN_CONTENT])?;
    let header = doc.append_new(main, "header", None, &["topbar"])?;
    let toggle = doc.append_new(header, "button", Some(ids::SIDEBAR_TOGGLE), &[])?;
    doc.append_new(toggle, "i", None, &["fas", "fa-bars"])?;

    let profile = doc.append_new(header, "div", None, &[USER_PROFILE])?;
    let user_name = doc.append_new(profile, "span", None, &["user-name"])?;
    doc.set_text(user_name, "Donor")?;
    let menu = doc.append_new(header, "div", None, &[DROPDOWN_MENU])?;
    for label in ["Profile", "Logout"] {
        let link = doc.append_new(menu, "a", None, &["dropdown-item"])?;
        doc.set_text(link, label)?;
    }

    doc.append_new(main, "div", None, &[MESSAGES])?;

    let panel = doc.append_new(main, "section", None, &[PATIENT_DETAILS])?;
    let photo = doc.append_new(panel, "img", Some(ids::PATIENT_PHOTO), &["patient-photo"])?;
    doc.set_attr(photo, "src", DEFAULT_PHOTO)?;
    doc.append_new(panel, "h2", Some(ids::PATIENT_NAME), &[])?;
    doc.append_new(panel, "span", Some(ids::PATIENT_AGE), &[])?;
    doc.append_new(panel, "span", Some(ids::PATIENT_CONDITION), &[])?;
    let progress = doc.append_new(panel, "div", None, &["progress"])?;
    let bar = doc.append_new(progress, "div", Some(ids::TREATMENT_PROGRESS), &["progress-bar"])?;
    doc.set_style(bar, "width", "0%")?;
    doc.append_new(panel, "span", Some(ids::PROGRESS_TEXT), &[])?;
    doc.append_new(panel, "div", Some(ids::TREATMENTS_LIST), &["treatments-list"])?;

    let tabs = doc.append_new(main, "div", None, &["tabs"])?;
    let buttons = doc.append_new(tabs, "div", None, &["tab-buttons"])?;
    for (pane, label, active) in [("overview", "Overview", true), ("history", "History", false)] {
        let classes: &[&str] = if active { &[TAB_BTN, ACTIVE] } else { &[TAB_BTN] };
        let btn = doc.append_new(buttons, "button", None, classes)?;
        doc.set_attr(btn, DATA_TAB, pane)?;
        doc.set_text(btn, label)?;
    }
    for (pane, active) in [("overview", true), ("history", false)] {
        let classes: &[&str] = if active { &[TAB_PANE, ACTIVE] } else { &[TAB_PANE] };
        doc.append_new(tabs, "div", Some(pane), classes)?;
    }

    let chart_box = doc.append_new(main, "div", None, &["chart-container"])?;
    doc.append_new(chart_box, "canvas", Some("donation-chart"), &[CHART])?;

    let hint = doc.append_new(main, "span", None, &["help-icon"])?;
    doc.set_attr(hint, TOOLTIP_TOGGLE, "tooltip")?;
    doc.set_attr(hint, "title", "Funds go directly to the patient's treatment")?;

    Ok(doc)
}

/// The donation change form in the admin: status select and amount input.
pub fn donation_admin_form() -> Result<Document, DomError> {
    use classes::*;

    let mut doc = Document::new();
    let body = doc.body();
    let form = doc.append_new(body, "form", Some("donation_form"), &[])?;

    let status_row = doc.append_new(form, "div", None, &["form-row", FIELD_STATUS])?;
    let select = doc.append_new(status_row, "select", Some("id_status"), &[])?;
    doc.set_attr(select, "name", "status")?;
    doc.set_value(select, "initiated")?;

    let amount_row = doc.append_new(form, "div", None, &["form-row", FIELD_AMOUNT])?;
    let input = doc.append_new(amount_row, "input", Some("id_amount"), &[])?;
    doc.set_attr(input, "name", "amount")?;
    doc.set_value(input, "")?;

    Ok(doc)
}
