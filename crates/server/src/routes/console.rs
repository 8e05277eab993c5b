//! Seller/admin console: dashboard, listings, lead updates and email.
//!
//! Sellers only ever see records assigned to them; admins see everything
//! and are the only ones who can list sellers or reassign leads.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use clientdesk_core::{ClientId, LeadId, LeadStatus, SellerId};

use crate::db::{ClientStore, LeadStore, SellerStore};
use crate::error::AppError;
use crate::middleware::{RequireAdmin, RequireConsoleUser};
use crate::models::{Client, ConsoleUser, Lead, Seller};
use crate::services::{Participant, signature};
use crate::state::AppState;

/// Console dashboard.
#[derive(Template, WebTemplate)]
#[template(path = "console.html")]
pub struct ConsoleTemplate {
    pub user: ConsoleUser,
    pub clients: Vec<Client>,
    pub leads: Vec<Lead>,
    pub sellers: Vec<Seller>,
}

/// GET /console
pub async fn dashboard(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
) -> Result<ConsoleTemplate, AppError> {
    let store = state.store();
    let clients = store.list_clients(user.scope()).await?;
    let leads = store.list_leads(user.scope()).await?;
    let sellers = if user.is_admin() {
        store.list_sellers().await?
    } else {
        Vec::new()
    };

    Ok(ConsoleTemplate {
        user,
        clients,
        leads,
        sellers,
    })
}

/// GET /api/console/clients
pub async fn list_clients(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
) -> Result<Json<Vec<Client>>, AppError> {
    Ok(Json(state.store().list_clients(user.scope()).await?))
}

/// GET /api/console/leads
pub async fn list_leads(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
) -> Result<Json<Vec<Lead>>, AppError> {
    Ok(Json(state.store().list_leads(user.scope()).await?))
}

/// GET /api/console/sellers
pub async fn list_sellers(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Seller>>, AppError> {
    Ok(Json(state.store().list_sellers().await?))
}

/// Body of a lead update. `sellerId: null` unassigns the lead.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default, deserialize_with = "present")]
    pub seller_id: Option<Option<SellerId>>,
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<SellerId>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<SellerId>::deserialize(deserializer).map(Some)
}

/// PATCH /api/console/leads/{id}
pub async fn update_lead(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
    Path(id): Path<String>,
    Json(update): Json<LeadUpdate>,
) -> Result<Json<Lead>, AppError> {
    let id = LeadId::parse(&id).map_err(|_| AppError::NotFound("Lead not found".to_string()))?;
    let store = state.store();

    let mut lead = store
        .get_lead(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;
    if !user.is_admin() && (lead.seller_id.is_none() || lead.seller_id != user.seller_id()) {
        return Err(AppError::Forbidden(
            "You do not have access to this lead".to_string(),
        ));
    }

    if let Some(seller_id) = update.seller_id {
        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can reassign leads".to_string(),
            ));
        }
        if let Some(seller_id) = seller_id
            && store.get_seller(seller_id).await?.is_none()
        {
            return Err(AppError::BadRequest("Unknown seller".to_string()));
        }
        lead = store.assign_lead(id, seller_id).await?;
    }

    if let Some(status) = update.status {
        lead = store.update_lead_status(id, status).await?;
    }

    info!(lead_id = %id, status = %lead.status, "Lead updated");
    Ok(Json(lead))
}

/// Body of `POST /api/console/email`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub client_id: ClientId,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct EmailSent {
    pub success: bool,
}

/// POST /api/console/email
///
/// Sends as the user's own seller row, or as the client's seller when an
/// admin without one writes.
pub async fn send_email(
    State(state): State<AppState>,
    RequireConsoleUser(user): RequireConsoleUser,
    Json(request): Json<EmailRequest>,
) -> Result<Json<EmailSent>, AppError> {
    let subject = request.subject.trim();
    if subject.is_empty() || request.html.trim().is_empty() {
        return Err(AppError::BadRequest(
            "subject and html are required".to_string(),
        ));
    }

    let store = state.store();
    let client = store
        .get_client(request.client_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;
    if !Participant::Console(&user).can_access(&client) {
        return Err(AppError::Forbidden(
            "You do not have access to this client".to_string(),
        ));
    }

    let seller_id = user
        .seller_id()
        .or(client.seller_id)
        .ok_or_else(|| AppError::BadRequest("No seller to send as".to_string()))?;
    let seller = store
        .get_seller(seller_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Seller not found".to_string()))?;

    signature::send_email(
        store,
        state.email(),
        &seller,
        &client,
        subject,
        &request.html,
    )
    .await?;

    info!(client_id = %client.id, seller_id = %seller.id, "Email sent to client");
    Ok(Json(EmailSent { success: true }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::testing::TestHarness;

    #[test]
    fn test_lead_update_distinguishes_null_from_missing() {
        let update: LeadUpdate = serde_json::from_value(json!({ "status": "contacted" })).unwrap();
        assert_eq!(update.status, Some(LeadStatus::Contacted));
        assert_eq!(update.seller_id, None);

        let update: LeadUpdate = serde_json::from_value(json!({ "sellerId": null })).unwrap();
        assert_eq!(update.seller_id, Some(None));
    }

    async fn get_json(harness: &TestHarness, cookie: &str, path: &str) -> (StatusCode, Value) {
        let response = harness
            .app()
            .oneshot(
                Request::get(path)
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_api_requires_login() {
        let harness = TestHarness::new();
        let (status, _) = get_json(&harness, "", "/api/console/clients").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_seller_sees_only_own_clients() {
        let harness = TestHarness::new();
        let (cookie, seller) = harness.login_seller("ana@example.com").await;
        harness.store.add_client("Acme", Some(seller.id));
        harness.store.add_client("Globex", None);

        let (status, body) = get_json(&harness, &cookie, "/api/console/clients").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["companyName"], "Acme");

        let (status, _) = get_json(&harness, &cookie, "/api/console/sellers").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_sees_everything() {
        let harness = TestHarness::new();
        let cookie = harness.login_admin("boss@example.com").await;
        harness.store.add_seller("ana@example.com");
        harness.store.add_client("Acme", None);
        harness.store.add_client("Globex", None);

        let (_, body) = get_json(&harness, &cookie, "/api/console/clients").await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        let (status, body) = get_json(&harness, &cookie, "/api/console/sellers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    fn patch(cookie: &str, lead: LeadId, body: &Value) -> Request<Body> {
        Request::patch(format!("/api/console/leads/{lead}"))
            .header(header::COOKIE, cookie)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_seller_updates_status_but_cannot_reassign() {
        let harness = TestHarness::new();
        let (cookie, seller) = harness.login_seller("ana@example.com").await;
        let lead = harness.store.add_lead("Initech", Some(seller.id));
        let other = harness.store.add_lead("Hooli", None);

        let response = harness
            .app()
            .oneshot(patch(&cookie, lead.id, &json!({ "status": "qualified" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stored = harness.store.get_lead(lead.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeadStatus::Qualified);

        let response = harness
            .app()
            .oneshot(patch(&cookie, lead.id, &json!({ "sellerId": null })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = harness
            .app()
            .oneshot(patch(&cookie, other.id, &json!({ "status": "lost" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_reassigns_lead() {
        let harness = TestHarness::new();
        let cookie = harness.login_admin("boss@example.com").await;
        let seller = harness.store.add_seller("ana@example.com");
        let lead = harness.store.add_lead("Initech", None);

        let response = harness
            .app()
            .oneshot(patch(&cookie, lead.id, &json!({ "sellerId": seller.id })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stored = harness.store.get_lead(lead.id).await.unwrap().unwrap();
        assert_eq!(stored.seller_id, Some(seller.id));

        let response = harness
            .app()
            .oneshot(patch(
                &cookie,
                lead.id,
                &json!({ "sellerId": SellerId::generate() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_email_without_smtp_is_unavailable() {
        let harness = TestHarness::new();
        let (cookie, seller) = harness.login_seller("ana@example.com").await;
        let client = harness.store.add_client("Acme", Some(seller.id));

        let response = harness
            .app()
            .oneshot(
                Request::post("/api/console/email")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "clientId": client.id, "subject": "Hi", "html": "<p>Hi</p>" })
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
