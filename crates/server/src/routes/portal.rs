//! Client portal dashboard.
//!
//! Clients see their subscription, their seller and the chat; leads see
//! where they are in the pipeline and the plans on offer.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use clientdesk_core::PortalRole;

use crate::db::{ClientStore, LeadStore, ProductStore, SellerStore};
use crate::error::AppError;
use crate::middleware::RequirePortalUser;
use crate::models::{ChatMessage, Client, Lead, PortalUser, Product, Seller};
use crate::services::{ChatService, Participant};
use crate::state::AppState;

/// Portal dashboard.
#[derive(Template, WebTemplate)]
#[template(path = "portal.html")]
pub struct PortalTemplate {
    pub user: PortalUser,
    pub client: Option<Client>,
    pub lead: Option<Lead>,
    pub seller: Option<Seller>,
    pub messages: Vec<ChatMessage>,
    pub unread: i64,
    pub products: Vec<Product>,
}

impl PortalTemplate {
    /// Company shown in the header.
    #[must_use]
    pub fn company(&self) -> &str {
        self.client
            .as_ref()
            .map(|c| c.company_name.as_str())
            .or_else(|| self.lead.as_ref().map(|l| l.company_name.as_str()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_client(&self) -> bool {
        self.user.role == PortalRole::Client
    }
}

/// GET /portal
pub async fn dashboard(
    State(state): State<AppState>,
    RequirePortalUser(user): RequirePortalUser,
) -> Result<PortalTemplate, AppError> {
    let store = state.store();

    let (client, lead) = match (user.role, user.client_id, user.lead_id) {
        (PortalRole::Client, Some(id), _) => (store.get_client(id).await?, None),
        (PortalRole::Lead, _, Some(id)) => (None, store.get_lead(id).await?),
        _ => (None, None),
    };
    if client.is_none() && lead.is_none() {
        return Err(AppError::NotFound("Portal account not found".to_string()));
    }

    let seller_id = client
        .as_ref()
        .and_then(|c| c.seller_id)
        .or_else(|| lead.as_ref().and_then(|l| l.seller_id));
    let seller = match seller_id {
        Some(id) => store.get_seller(id).await?,
        None => None,
    };

    let (messages, unread) = match &client {
        Some(client) => {
            let chat = ChatService::new(store);
            let participant = Participant::Portal(&user);
            (
                chat.history(participant, client.id, None).await?,
                chat.unread(participant, client.id).await?,
            )
        }
        None => (Vec::new(), 0),
    };

    let products = store.list_products(true).await?;

    Ok(PortalTemplate {
        user,
        client,
        lead,
        seller,
        messages,
        unread,
        products,
    })
}
