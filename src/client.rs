//! Patient detail API client.
//!
//! `PatientSource` is the seam the loader depends on. `HttpPatientClient`
//! talks to `GET {base}/api/patients/{id}/`; `MockPatientSource` serves
//! canned replies with optional latency for tests and previews.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;

use crate::config::DashboardConfig;
use crate::models::{ContractError, PatientDetail, PatientId};

/// Errors from fetching a patient detail.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot connect to patient API at {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Patient API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Invalid patient payload: {0}")]
    InvalidPayload(#[from] ContractError),
}

#[async_trait]
pub trait PatientSource: Send + Sync {
    async fn fetch_patient(&self, id: &PatientId) -> Result<PatientDetail, LoadError>;
}

// ═══════════════════════════════════════════════════════════
// HTTP client
// ═══════════════════════════════════════════════════════════

pub struct HttpPatientClient {
    base_url: Url,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpPatientClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LoadError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| LoadError::HttpClient(format!("Invalid base URL {base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url,
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, LoadError> {
        Self::new(&config.api_base, config.request_timeout)
    }

    /// `{base}/api/patients/{id}/`, with the id percent-encoded as one segment.
    pub fn patient_url(&self, id: &PatientId) -> Result<Url, LoadError> {
        let segment = id.to_string();
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LoadError::HttpClient(format!("Base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "patients", segment.as_str(), ""]);
        Ok(url)
    }
}

#[async_trait]
impl PatientSource for HttpPatientClient {
    async fn fetch_patient(&self, id: &PatientId) -> Result<PatientDetail, LoadError> {
        let url = self.patient_url(id)?;
        tracing::debug!(%url, "Fetching patient detail");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LoadError::Connection(self.base_url.to_string())
                } else if e.is_timeout() {
                    LoadError::Timeout(self.timeout_secs)
                } else {
                    LoadError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LoadError::Timeout(self.timeout_secs)
            } else {
                LoadError::HttpClient(e.to_string())
            }
        })?;

        Ok(PatientDetail::from_json(&body)?)
    }
}

// ═══════════════════════════════════════════════════════════
// Mock source
// ═══════════════════════════════════════════════════════════

/// Canned reply for one patient id.
#[derive(Debug, Clone)]
pub enum MockReply {
    Detail(PatientDetail),
    Status(u16),
    Unreachable,
}

/// Mock patient source: canned replies per id, with optional latency.
#[derive(Default)]
pub struct MockPatientSource {
    replies: HashMap<PatientId, (Duration, MockReply)>,
    calls: AtomicUsize,
}

impl MockPatientSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, detail: PatientDetail) -> Self {
        self.replies
            .insert(detail.id.clone(), (Duration::ZERO, MockReply::Detail(detail)));
        self
    }

    pub fn with_reply(mut self, id: PatientId, delay: Duration, reply: MockReply) -> Self {
        self.replies.insert(id, (delay, reply));
        self
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatientSource for MockPatientSource {
    async fn fetch_patient(&self, id: &PatientId) -> Result<PatientDetail, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((delay, reply)) = self.replies.get(id) else {
            return Err(LoadError::Status {
                status: 404,
                body: format!("No patient {id}"),
            });
        };
        if !delay.is_zero() {
            tokio::time::sleep(*delay).await;
        }
        match reply {
            MockReply::Detail(detail) => Ok(detail.clone()),
            MockReply::Status(status) => Err(LoadError::Status {
                status: *status,
                body: String::new(),
            }),
            MockReply::Unreachable => Err(LoadError::Connection("mock".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;

    async fn patient_handler(Path(id): Path<String>) -> axum::response::Response {
        match id.as_str() {
            "12" => (
                [("content-type", "application/json")],
                r#"{"id": 12, "name": "Maria Joseph", "age": 31, "condition": "Malaria complications",
                    "treatment_progress": 40,
                    "treatments": [{"date": "2024-06-01", "name": "IV quinine", "hospital": "Amana", "estimated_cost": "85000.00"}]}"#,
            )
                .into_response(),
            "13" => (StatusCode::OK, "not json").into_response(),
            "14" => (
                StatusCode::OK,
                r#"{"id": 14, "name": "", "age": 1, "condition": "x", "treatment_progress": 1}"#,
            )
                .into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                (StatusCode::OK, "{}").into_response()
            }
            _ => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }

    async fn start_fake_api() -> SocketAddr {
        let app = Router::new().route("/api/patients/:id/", get(patient_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr, timeout: Duration) -> HttpPatientClient {
        HttpPatientClient::new(&format!("http://{addr}"), timeout).unwrap()
    }

    #[test]
    fn patient_url_has_trailing_slash() {
        let client = HttpPatientClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        let url = client.patient_url(&PatientId::Number(12)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/patients/12/");
    }

    #[test]
    fn patient_url_keeps_base_path_and_encodes_id() {
        let client = HttpPatientClient::new("https://rhci.example/platform", Duration::from_secs(5)).unwrap();
        let url = client.patient_url(&PatientId::Text("a b/c".into())).unwrap();
        assert_eq!(url.as_str(), "https://rhci.example/platform/api/patients/a%20b%2Fc/");
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(matches!(
            HttpPatientClient::new("not a url", Duration::from_secs(5)),
            Err(LoadError::HttpClient(_))
        ));
    }

    #[tokio::test]
    async fn fetches_and_validates_patient() {
        let addr = start_fake_api().await;
        let client = client_for(addr, Duration::from_secs(5));
        let detail = client.fetch_patient(&PatientId::Number(12)).await.unwrap();
        assert_eq!(detail.name, "Maria Joseph");
        assert_eq!(detail.treatments.len(), 1);
        assert_eq!(detail.treatments[0].estimated_cost, 85000.0);
    }

    #[tokio::test]
    async fn not_found_maps_to_status() {
        let addr = start_fake_api().await;
        let client = client_for(addr, Duration::from_secs(5));
        match client.fetch_patient(&PatientId::Number(99)).await {
            Err(LoadError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Not found");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_payload() {
        let addr = start_fake_api().await;
        let client = client_for(addr, Duration::from_secs(5));
        let err = client.fetch_patient(&PatientId::Number(13)).await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidPayload(ContractError::Malformed(_))));
    }

    #[tokio::test]
    async fn contract_violation_is_invalid_payload() {
        let addr = start_fake_api().await;
        let client = client_for(addr, Duration::from_secs(5));
        let err = client.fetch_patient(&PatientId::Number(14)).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidPayload(ContractError::EmptyField { field: "name" })
        ));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let addr = start_fake_api().await;
        let client = client_for(addr, Duration::from_millis(200));
        let err = client
            .fetch_patient(&PatientId::Text("slow".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn closed_port_is_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(addr, Duration::from_secs(2));
        let err = client.fetch_patient(&PatientId::Number(1)).await.unwrap_err();
        assert!(matches!(err, LoadError::Connection(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn mock_serves_known_and_unknown_ids() {
        let mock = MockPatientSource::new()
            .with_reply(PatientId::Number(5), Duration::ZERO, MockReply::Status(500))
            .with_reply(PatientId::Number(6), Duration::ZERO, MockReply::Unreachable);

        assert!(matches!(
            mock.fetch_patient(&PatientId::Number(5)).await,
            Err(LoadError::Status { status: 500, .. })
        ));
        assert!(matches!(
            mock.fetch_patient(&PatientId::Number(6)).await,
            Err(LoadError::Connection(_))
        ));
        assert!(matches!(
            mock.fetch_patient(&PatientId::Number(7)).await,
            Err(LoadError::Status { status: 404, .. })
        ));
        assert_eq!(mock.calls(), 3);
    }
}
