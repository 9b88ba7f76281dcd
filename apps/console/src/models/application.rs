use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    New,
    Reviewing,
    Shortlisted,
    Rejected,
    Hired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job_posting: Uuid,
    pub candidate_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub review_note: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationReview {
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
}

/// Payload of the public, unauthenticated application form.
#[derive(Debug, Clone, Serialize)]
pub struct PublicApplication {
    pub job_posting: Uuid,
    pub candidate_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
}
