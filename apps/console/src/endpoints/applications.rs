use uuid::Uuid;

use crate::client::{ApiClient, RequestContext};
use crate::errors::ApiError;
use crate::models::application::{Application, ApplicationReview, PublicApplication};
use crate::models::Page;

const APPLICATIONS_PATH: &str = "/api/applications/";
const PUBLIC_APPLICATIONS_PATH: &str = "/api/public/applications/";

fn application_path(id: Uuid) -> String {
    format!("{APPLICATIONS_PATH}{id}/")
}

/// GET /api/applications/?job_posting=:id
pub async fn list_applications(
    client: &ApiClient,
    job_posting: Uuid,
    page: Option<u32>,
) -> Result<Page<Application>, ApiError> {
    let ctx = RequestContext::get(APPLICATIONS_PATH)
        .query("job_posting", job_posting)
        .query_opt("page", page);
    client.send_json(ctx).await
}

/// GET /api/applications/:id/
pub async fn get_application(client: &ApiClient, id: Uuid) -> Result<Application, ApiError> {
    client.send_json(RequestContext::get(application_path(id))).await
}

/// PATCH /api/applications/:id/
pub async fn review_application(
    client: &ApiClient,
    id: Uuid,
    review: &ApplicationReview,
) -> Result<Application, ApiError> {
    let ctx = RequestContext::patch(application_path(id)).json(review)?;
    client.send_json(ctx).await
}

/// POST /api/public/applications/
///
/// The candidate-facing form. Needs no session.
pub async fn submit_public_application(
    client: &ApiClient,
    application: &PublicApplication,
) -> Result<(), ApiError> {
    let ctx = RequestContext::post(PUBLIC_APPLICATIONS_PATH).json(application)?;
    client.send_empty(ctx).await
}
