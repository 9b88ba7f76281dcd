use uuid::Uuid;

use crate::client::{ApiClient, RequestContext};
use crate::errors::ApiError;
use crate::models::cooptation::{Cooptation, CooptationStatus, NewCooptation};
use crate::models::Page;

const COOPTATIONS_PATH: &str = "/api/cooptations/";

/// GET /api/cooptations/
pub async fn list_cooptations(
    client: &ApiClient,
    status: Option<CooptationStatus>,
) -> Result<Page<Cooptation>, ApiError> {
    let ctx = RequestContext::get(COOPTATIONS_PATH).query_opt("status", status.map(|s| s.as_str()));
    client.send_json(ctx).await
}

/// POST /api/cooptations/
pub async fn create_cooptation(
    client: &ApiClient,
    cooptation: &NewCooptation,
) -> Result<Cooptation, ApiError> {
    let ctx = RequestContext::post(COOPTATIONS_PATH).json(cooptation)?;
    client.send_json(ctx).await
}

/// PATCH /api/cooptations/:id/
pub async fn update_cooptation_status(
    client: &ApiClient,
    id: Uuid,
    status: CooptationStatus,
) -> Result<Cooptation, ApiError> {
    let ctx = RequestContext::patch(format!("{COOPTATIONS_PATH}{id}/"))
        .json(&serde_json::json!({ "status": status }))?;
    client.send_json(ctx).await
}
