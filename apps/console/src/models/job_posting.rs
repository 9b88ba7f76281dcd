use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum JobPostingStatus {
    Draft,
    Published,
    Archived,
}

impl JobPostingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPostingStatus::Draft => "draft",
            JobPostingStatus::Published => "published",
            JobPostingStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contract_type: Option<String>,
    pub status: JobPostingStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewJobPosting {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
}

/// Partial update; only the fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobPostingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobPostingStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct JobPostingQuery {
    pub status: Option<JobPostingStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_only_serializes_set_fields() {
        let update = JobPostingUpdate {
            status: Some(JobPostingStatus::Published),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"status": "published"})
        );
    }

    #[test]
    fn test_posting_deserializes_without_optional_fields() {
        let posting: JobPosting = serde_json::from_value(json!({
            "id": "6f1c1a52-4f6e-4a51-9d3c-1f1f0f2b7a10",
            "title": "Chargé de recrutement",
            "description": "CDI à Lyon",
            "status": "draft",
            "created_at": "2024-03-01T09:00:00Z"
        }))
        .unwrap();
        assert_eq!(posting.status, JobPostingStatus::Draft);
        assert!(posting.location.is_none());
    }
}
