//! Patient detail loader.
//!
//! Fetches one patient, renders the panel view-model and writes it into the
//! page. Every load takes a generation number when it starts; a result that
//! comes back after a newer load has started is dropped without touching the
//! page, so the panel always reflects the most recent request.
//!
//! Failures never escape: they are logged and surfaced as a single error
//! banner, and the outcome is returned to the caller as a value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::{AbortHandle, JoinHandle};

use crate::client::{LoadError, PatientSource};
use crate::config::DashboardConfig;
use crate::dom::{self, DomError, SharedDocument};
use crate::models::PatientId;
use crate::notify::{NotificationCenter, NotificationKind};
use crate::page::PatientSlots;
use crate::view::{PatientPanelView, RenderOptions};

pub const LOAD_ERROR_MESSAGE: &str = "Error loading patient details. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error(transparent)]
    Fetch(#[from] LoadError),
    #[error("Rendering patient panel failed: {0}")]
    Render(#[from] DomError),
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// The panel now shows this view.
    Rendered(PatientPanelView),
    /// A newer load started first; nothing was written.
    Superseded,
    /// Error banner shown, panel left as it was.
    Failed(LoadFailure),
}

impl LoadOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

pub struct PatientLoader {
    source: Arc<dyn PatientSource>,
    doc: SharedDocument,
    notifications: NotificationCenter,
    slots: PatientSlots,
    options: RenderOptions,
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl PatientLoader {
    pub fn new(
        source: Arc<dyn PatientSource>,
        doc: SharedDocument,
        notifications: NotificationCenter,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            source,
            doc,
            notifications,
            slots: PatientSlots::default(),
            options: RenderOptions {
                clamp_progress: config.clamp_progress,
            },
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn with_slots(mut self, slots: PatientSlots) -> Self {
        self.slots = slots;
        self
    }

    /// Load `id` into the panel and report what happened.
    pub async fn load(&self, id: PatientId) -> LoadOutcome {
        let generation = self.begin();
        self.run(id, generation).await
    }

    /// Start a load in the background, aborting the previous background
    /// load if it is still running.
    ///
    /// The in-flight slot stays locked from taking the generation ticket
    /// until the new handle is stored, so concurrent callers cannot abort a
    /// newer load with an older one.
    pub fn spawn_load(self: &Arc<Self>, id: PatientId) -> JoinHandle<LoadOutcome> {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.begin();
        let loader = Arc::clone(self);
        let handle = tokio::spawn(async move { loader.run(id, generation).await });

        if let Some(previous) = slot.replace(handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Abandon whatever load is running. Its result, if any, is discarded.
    pub fn cancel(&self) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        self.begin();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run(&self, id: PatientId, generation: u64) -> LoadOutcome {
        let result = self.source.fetch_patient(&id).await;

        if !self.is_current(generation) {
            tracing::debug!(patient_id = %id, generation, "Patient load superseded");
            return LoadOutcome::Superseded;
        }

        let detail = match result {
            Ok(detail) => detail,
            Err(e) => return self.fail(&id, e.into()),
        };

        let view = PatientPanelView::render(&detail, self.options);
        let applied = dom::lock(&self.doc).and_then(|mut doc| view.apply(&mut doc, &self.slots));
        if let Err(e) = applied {
            return self.fail(&id, e.into());
        }

        tracing::info!(
            patient_id = %id,
            generation,
            treatments = view.card_count(),
            "Patient details rendered"
        );
        LoadOutcome::Rendered(view)
    }

    fn fail(&self, id: &PatientId, failure: LoadFailure) -> LoadOutcome {
        tracing::error!(patient_id = %id, error = %failure, "Error loading patient details");
        if let Err(e) = self
            .notifications
            .show(LOAD_ERROR_MESSAGE, NotificationKind::Error)
        {
            tracing::warn!(error = %e, "Could not show load error notification");
        }
        LoadOutcome::Failed(failure)
    }
}
