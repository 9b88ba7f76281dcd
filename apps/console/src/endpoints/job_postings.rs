use uuid::Uuid;

use crate::client::{ApiClient, RequestContext};
use crate::errors::ApiError;
use crate::models::job_posting::{
    JobPosting, JobPostingQuery, JobPostingStatus, JobPostingUpdate, NewJobPosting,
};
use crate::models::Page;

const JOB_POSTINGS_PATH: &str = "/api/job-postings/";

fn posting_path(id: Uuid) -> String {
    format!("{JOB_POSTINGS_PATH}{id}/")
}

/// GET /api/job-postings/
pub async fn list_job_postings(
    client: &ApiClient,
    query: &JobPostingQuery,
) -> Result<Page<JobPosting>, ApiError> {
    let ctx = RequestContext::get(JOB_POSTINGS_PATH)
        .query_opt("status", query.status.map(|s| s.as_str()))
        .query_opt("search", query.search.as_deref())
        .query_opt("page", query.page);
    client.send_json(ctx).await
}

/// GET /api/job-postings/:id/
pub async fn get_job_posting(client: &ApiClient, id: Uuid) -> Result<JobPosting, ApiError> {
    client.send_json(RequestContext::get(posting_path(id))).await
}

/// POST /api/job-postings/
pub async fn create_job_posting(
    client: &ApiClient,
    posting: &NewJobPosting,
) -> Result<JobPosting, ApiError> {
    let ctx = RequestContext::post(JOB_POSTINGS_PATH).json(posting)?;
    client.send_json(ctx).await
}

/// PATCH /api/job-postings/:id/
pub async fn update_job_posting(
    client: &ApiClient,
    id: Uuid,
    update: &JobPostingUpdate,
) -> Result<JobPosting, ApiError> {
    let ctx = RequestContext::patch(posting_path(id)).json(update)?;
    client.send_json(ctx).await
}

pub async fn set_job_posting_status(
    client: &ApiClient,
    id: Uuid,
    status: JobPostingStatus,
) -> Result<JobPosting, ApiError> {
    let update = JobPostingUpdate {
        status: Some(status),
        ..Default::default()
    };
    update_job_posting(client, id, &update).await
}

/// DELETE /api/job-postings/:id/
pub async fn delete_job_posting(client: &ApiClient, id: Uuid) -> Result<(), ApiError> {
    client.send_empty(RequestContext::delete(posting_path(id))).await
}
