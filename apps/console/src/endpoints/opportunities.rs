use crate::client::{ApiClient, RequestContext};
use crate::errors::ApiError;
use crate::models::opportunity::{Opportunity, OpportunityQuery};
use crate::models::Page;

const OPPORTUNITIES_PATH: &str = "/api/opportunities/";

/// GET /api/opportunities/
pub async fn list_opportunities(
    client: &ApiClient,
    query: &OpportunityQuery,
) -> Result<Page<Opportunity>, ApiError> {
    let ctx = RequestContext::get(OPPORTUNITIES_PATH)
        .query_opt("search", query.search.as_deref())
        .query_opt("page", query.page)
        .query_opt("page_size", query.page_size);
    client.send_json(ctx).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::testing::{Reply, ScriptedTransport};
    use crate::client::AuthPaths;
    use crate::session::MemorySessionStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_opportunities_decodes_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script(
            OPPORTUNITIES_PATH,
            Reply::json(json!({
                "count": 1,
                "next": "http://api/opportunities/?page=2",
                "previous": null,
                "results": [{
                    "id": "0b6f3a1e-9a0c-4d7e-8f61-5d7f3c9e2a11",
                    "title": "Data engineer",
                    "company": "Acme",
                    "created_at": "2024-05-02T08:30:00Z"
                }]
            })),
        );
        let client = ApiClient::new(
            transport.clone(),
            Arc::new(MemorySessionStore::new()),
            AuthPaths::default(),
        );

        let page = list_opportunities(
            &client,
            &OpportunityQuery {
                search: Some("data".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(page.results[0].title, "Data engineer");
        assert_eq!(page.results[0].company.as_deref(), Some("Acme"));
        assert!(page.has_more());
    }
}
