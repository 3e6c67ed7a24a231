//! Patient detail contract for `GET /api/patients/{id}/`.
//!
//! The wire shape (`PatientPayload`) is deserialised first and then
//! validated into `PatientDetail`, so nothing downstream renders a payload
//! that failed the contract.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ContractError;

/// Patient identifier: the API uses integers, callers may hold strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatientId {
    Number(u64),
    Text(String),
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for PatientId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PatientId {
    fn from(value: &str) -> Self {
        match value.parse::<u64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientDetail {
    pub id: PatientId,
    pub name: String,
    pub age: u32,
    pub condition: String,
    /// Nominally 0–100; not clamped here.
    pub treatment_progress: f64,
    pub photo: Option<String>,
    /// Display order.
    pub treatments: Vec<Treatment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Treatment {
    pub date: NaiveDate,
    pub name: String,
    pub hospital: String,
    /// In TZS.
    pub estimated_cost: f64,
}

impl PatientDetail {
    /// Parse and validate a response body.
    pub fn from_json(body: &str) -> Result<Self, ContractError> {
        let payload: PatientPayload =
            serde_json::from_str(body).map_err(|e| ContractError::Malformed(e.to_string()))?;
        payload.validate()
    }
}

// ═══════════════════════════════════════════════════════════
// Wire shape
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct PatientPayload {
    pub id: PatientId,
    pub name: String,
    pub age: u32,
    pub condition: String,
    pub treatment_progress: f64,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub treatments: Option<Vec<TreatmentPayload>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreatmentPayload {
    pub date: String,
    pub name: String,
    pub hospital: String,
    pub estimated_cost: CostValue,
}

/// Decimal fields arrive as numbers or as strings (`"150000.00"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CostValue {
    Number(f64),
    Text(String),
}

impl PatientPayload {
    pub fn validate(self) -> Result<PatientDetail, ContractError> {
        if self.name.trim().is_empty() {
            return Err(ContractError::EmptyField { field: "name" });
        }
        if !self.treatment_progress.is_finite() {
            return Err(ContractError::NonFinite {
                field: "treatment_progress",
            });
        }

        let treatments = self
            .treatments
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, t)| t.validate(index))
            .collect::<Result<Vec<_>, _>>()?;

        // An empty photo is the same as none: the prior image stays.
        let photo = self.photo.filter(|p| !p.trim().is_empty());

        Ok(PatientDetail {
            id: self.id,
            name: self.name,
            age: self.age,
            condition: self.condition,
            treatment_progress: self.treatment_progress,
            photo,
            treatments,
        })
    }
}

impl TreatmentPayload {
    fn validate(self, index: usize) -> Result<Treatment, ContractError> {
        let date = parse_date(&self.date).ok_or_else(|| ContractError::InvalidDate {
            index,
            value: self.date.clone(),
        })?;

        let estimated_cost = match &self.estimated_cost {
            CostValue::Number(n) => *n,
            CostValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                ContractError::InvalidCost {
                    index,
                    value: s.clone(),
                }
            })?,
        };
        if !estimated_cost.is_finite() || estimated_cost < 0.0 {
            return Err(ContractError::InvalidCost {
                index,
                value: estimated_cost.to_string(),
            });
        }

        Ok(Treatment {
            date,
            name: self.name,
            hospital: self.hospital,
            estimated_cost,
        })
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (calendar date as written).
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
