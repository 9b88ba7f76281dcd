use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CooptationStatus {
    Pending,
    InReview,
    Hired,
    Rejected,
}

impl CooptationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CooptationStatus::Pending => "pending",
            CooptationStatus::InReview => "in_review",
            CooptationStatus::Hired => "hired",
            CooptationStatus::Rejected => "rejected",
        }
    }
}

/// An employee referral of a candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cooptation {
    pub id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    #[serde(default)]
    pub job_posting: Option<Uuid>,
    #[serde(default)]
    pub referrer: Option<String>,
    pub status: CooptationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCooptation {
    pub candidate_name: String,
    pub candidate_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_posting: Option<Uuid>,
}
