//! Donor dashboard event handling.
//!
//! `DashboardController` is bound once to the page and then receives UI
//! events. Each behaviour is an independent class toggle on elements named
//! by the page contract; handlers run to completion and never hold the
//! document lock while calling into the notification center.

use serde::Serialize;

use crate::dom::{self, Document, DomError, NodeId, SharedDocument};
use crate::notify::NotificationCenter;
use crate::page::{classes, ids, DATA_TAB, TOOLTIP_TOGGLE};

/// Width the expanded sidebar takes from the viewport.
pub const SIDEBAR_WIDTH_PX: u32 = 250;

const TOOLTIP_READY_ATTR: &str = "data-tooltip-ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Click(NodeId),
    Resize(Viewport),
}

/// A chart that follows the viewport size.
pub trait ResizableChart: Send {
    fn canvas(&self) -> NodeId;
    fn resize(&mut self, doc: &mut Document, viewport: Viewport) -> Result<(), DomError>;
}

/// Canvas-backed chart keeping a fixed aspect ratio.
pub struct CanvasChart {
    canvas: NodeId,
    aspect_ratio: f64,
    resizes: u32,
}

impl CanvasChart {
    pub fn new(canvas: NodeId) -> Self {
        Self {
            canvas,
            aspect_ratio: 2.0,
            resizes: 0,
        }
    }

    pub fn resizes(&self) -> u32 {
        self.resizes
    }
}

impl ResizableChart for CanvasChart {
    fn canvas(&self) -> NodeId {
        self.canvas
    }

    fn resize(&mut self, doc: &mut Document, viewport: Viewport) -> Result<(), DomError> {
        let sidebar_open = doc
            .get_element_by_id(ids::SIDEBAR)
            .map(|s| doc.get(s).map(|el| !el.has_class(classes::COLLAPSED)))
            .transpose()?
            .unwrap_or(false);
        let width = if sidebar_open {
            viewport.width.saturating_sub(SIDEBAR_WIDTH_PX)
        } else {
            viewport.width
        };
        let height = (f64::from(width) / self.aspect_ratio).round() as u32;

        doc.set_attr(self.canvas, "width", &width.to_string())?;
        doc.set_attr(self.canvas, "height", &height.to_string())?;
        self.resizes += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    #[serde(skip)]
    pub target: NodeId,
    pub text: String,
}

pub struct DashboardController {
    doc: SharedDocument,
    notifications: NotificationCenter,
    charts: Vec<Box<dyn ResizableChart>>,
    tooltips: Vec<Tooltip>,
}

impl DashboardController {
    /// Bind to the page: register every `.chart` canvas and initialise tooltips.
    pub fn bind(doc: SharedDocument, notifications: NotificationCenter) -> Result<Self, DomError> {
        let charts = {
            let guard = dom::lock(&doc)?;
            guard
                .elements_by_class(classes::CHART)
                .into_iter()
                .map(|node| Box::new(CanvasChart::new(node)) as Box<dyn ResizableChart>)
                .collect()
        };
        let mut controller = Self {
            doc,
            notifications,
            charts,
            tooltips: Vec::new(),
        };
        controller.init_tooltips()?;
        Ok(controller)
    }

    pub fn register_chart(&mut self, chart: Box<dyn ResizableChart>) {
        self.charts.push(chart);
    }

    pub fn chart_count(&self) -> usize {
        self.charts.len()
    }

    pub fn tooltips(&self) -> &[Tooltip] {
        &self.tooltips
    }

    pub fn handle(&mut self, event: UiEvent) -> Result<(), DomError> {
        match event {
            UiEvent::Click(target) => self.handle_click(target),
            UiEvent::Resize(viewport) => self.resize_charts(viewport),
        }
    }

    /// Dispatch a click the way the page's listeners are wired: sidebar
    /// triggers, user menu (with outside-click dismissal), tab buttons and
    /// message close controls.
    ///
    /// Every listener runs even when an earlier one fails; the first error
    /// is returned after all of them have run.
    pub fn handle_click(&mut self, target: NodeId) -> Result<(), DomError> {
        let mut first_error = None;
        let mut record = |listener: &'static str, result: Result<(), DomError>| {
            if let Err(e) = result {
                tracing::warn!(listener, error = %e, "Click listener failed");
                first_error.get_or_insert(e);
            }
        };

        let close_control = {
            let mut doc = dom::lock(&self.doc)?;

            if doc.closest_with_id(target, ids::SIDEBAR_TOGGLE).is_some()
                || doc.closest_with_id(target, ids::COLLAPSE_SIDEBAR).is_some()
            {
                record("sidebar", toggle_sidebar(&mut doc));
            }

            let inside_profile = doc.closest_with_class(target, classes::USER_PROFILE).is_some();
            record("user_menu", update_user_menu(&mut doc, inside_profile));

            if let Some(button) = doc.closest_with_class(target, classes::TAB_BTN) {
                record("tabs", activate_tab(&mut doc, button));
            }

            doc.closest_with_class(target, classes::CLOSE_MESSAGE)
        };

        if let Some(close) = close_control {
            record("close_message", self.notifications.dismiss(close).map(|_| ()));
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn toggle_sidebar(&self) -> Result<(), DomError> {
        let mut doc = dom::lock(&self.doc)?;
        toggle_sidebar(&mut doc)
    }

    pub fn resize_charts(&mut self, viewport: Viewport) -> Result<(), DomError> {
        let mut doc = dom::lock(&self.doc)?;
        for chart in &mut self.charts {
            chart.resize(&mut doc, viewport)?;
        }
        tracing::trace!(charts = self.charts.len(), width = viewport.width, "Charts resized");
        Ok(())
    }

    /// Initialise tooltip triggers not seen before. Returns how many were added.
    pub fn init_tooltips(&mut self) -> Result<usize, DomError> {
        let mut doc = dom::lock(&self.doc)?;
        let mut added = 0;
        for node in doc.elements_with_attr(TOOLTIP_TOGGLE, "tooltip") {
            if doc.get(node)?.attr(TOOLTIP_READY_ATTR).is_some() {
                continue;
            }
            let text = doc.get(node)?.attr("title").unwrap_or_default().to_string();
            doc.set_attr(node, TOOLTIP_READY_ATTR, "true")?;
            self.tooltips.push(Tooltip { target: node, text });
            added += 1;
        }
        Ok(added)
    }
}

/// Toggle the sidebar and the main content independently: whichever of
/// the two exists is flipped, and a missing one is reported afterwards.
fn toggle_sidebar(doc: &mut Document) -> Result<(), DomError> {
    let sidebar = doc.get_element_by_id(ids::SIDEBAR);
    let main = doc.first_by_class(classes::MAIN_CONTENT);

    if let Some(sidebar) = sidebar {
        let collapsed = doc.toggle_class(sidebar, classes::COLLAPSED)?;
        tracing::debug!(collapsed, "Sidebar toggled");
    }
    if let Some(main) = main {
        doc.toggle_class(main, classes::SIDEBAR_COLLAPSED)?;
    }

    match (sidebar, main) {
        (None, _) => Err(DomError::MissingElement(format!("#{}", ids::SIDEBAR))),
        (_, None) => Err(DomError::MissingElement(format!(".{}", classes::MAIN_CONTENT))),
        _ => Ok(()),
    }
}

fn update_user_menu(doc: &mut Document, inside_profile: bool) -> Result<(), DomError> {
    for menu in doc.elements_by_class(classes::DROPDOWN_MENU) {
        if inside_profile {
            doc.toggle_class(menu, classes::ACTIVE)?;
        } else {
            doc.remove_class(menu, classes::ACTIVE)?;
        }
    }
    Ok(())
}

/// Make `button` the active tab among its sibling buttons and show the
/// pane whose id is the button's `data-tab`.
///
/// Panes are cleared among the target pane's siblings. When the pane does
/// not exist the button still becomes active, every pane on the page is
/// cleared and the missing pane is reported.
fn activate_tab(doc: &mut Document, button: NodeId) -> Result<(), DomError> {
    let pane_id = doc.get(button)?.attr(DATA_TAB).map(str::to_string);
    let pane = pane_id.as_deref().and_then(|id| doc.get_element_by_id(id));

    for sibling in siblings_with_class(doc, button, classes::TAB_BTN)? {
        doc.remove_class(sibling, classes::ACTIVE)?;
    }
    doc.add_class(button, classes::ACTIVE)?;

    let Some(pane) = pane else {
        for other in doc.elements_by_class(classes::TAB_PANE) {
            doc.remove_class(other, classes::ACTIVE)?;
        }
        return Err(DomError::MissingElement(match pane_id {
            Some(id) => format!("#{id}"),
            None => format!("[{DATA_TAB}]"),
        }));
    };

    for sibling in siblings_with_class(doc, pane, classes::TAB_PANE)? {
        doc.remove_class(sibling, classes::ACTIVE)?;
    }
    doc.add_class(pane, classes::ACTIVE)?;
    Ok(())
}

fn siblings_with_class(doc: &Document, node: NodeId, class: &str) -> Result<Vec<NodeId>, DomError> {
    let Some(parent) = doc.get(node)?.parent() else {
        return Ok(vec![node]);
    };
    let mut out = Vec::new();
    for child in doc.get(parent)?.children() {
        if doc.get(*child)?.has_class(class) {
            out.push(*child);
        }
    }
    Ok(out)
}
