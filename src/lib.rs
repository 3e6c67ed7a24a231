pub mod admin;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod dom;
pub mod format;
pub mod loader;
pub mod models;
pub mod notify;
pub mod page;
pub mod view;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::client::{HttpPatientClient, LoadError};
use crate::config::{ConfigError, DashboardConfig};
use crate::dom::DomError;
use crate::loader::{LoadOutcome, PatientLoader};
use crate::models::PatientId;
use crate::notify::NotificationCenter;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Usage: donor-dashboard <patient-id>")]
    Usage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] LoadError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("Patient {0} could not be shown")]
    NotShown(PatientId),
}

/// Preview entry point: fetch one patient into a fresh dashboard page and
/// print the rendered panel plus any notifications.
pub fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let id = patient_id_arg(std::env::args())?;
    let config = DashboardConfig::from_env()?;
    tracing::debug!(api_base = %config.api_base, patient_id = %id, "Configuration loaded");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let doc = dom::shared(page::donor_dashboard()?);
        let notifications = NotificationCenter::new(doc.clone(), &config);
        let source = Arc::new(HttpPatientClient::from_config(&config)?);
        let loader = PatientLoader::new(source, doc.clone(), notifications.clone(), &config);

        let outcome = loader.load(id.clone()).await;

        for message in notifications.visible()? {
            println!("[{}] {}", message.kind, message.message);
        }
        match outcome {
            LoadOutcome::Rendered(_) => {
                let doc = dom::lock(&doc)?;
                let panel = doc.require_class(page::classes::PATIENT_DETAILS)?;
                println!("{}", doc.outer_html(panel)?);
                Ok(())
            }
            LoadOutcome::Superseded | LoadOutcome::Failed(_) => Err(RunError::NotShown(id)),
        }
    })
}

/// Patient id from the first argument after the program name.
fn patient_id_arg<I>(args: I) -> Result<PatientId, RunError>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .nth(1)
        .map(|raw| PatientId::from(raw.as_str()))
        .ok_or(RunError::Usage)
}
