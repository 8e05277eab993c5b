//! Identities stored in the session after login.

use serde::{Deserialize, Serialize};

use clientdesk_core::{AuthUserId, ClientId, ConsoleRole, Email, LeadId, PortalRole, SellerId};

/// Someone logged into the client portal through the keypad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalUser {
    pub user_id: AuthUserId,
    pub email: Email,
    pub display_name: String,
    pub role: PortalRole,
    /// Set for clients.
    pub client_id: Option<ClientId>,
    /// Set for leads.
    pub lead_id: Option<LeadId>,
}

/// What a console user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsoleAccess {
    /// Everything. An admin may also own a seller row.
    Admin { seller_id: Option<SellerId> },
    /// Only records assigned to this seller.
    Seller { seller_id: SellerId },
}

/// Someone logged into the management console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleUser {
    pub user_id: AuthUserId,
    pub email: Email,
    pub display_name: String,
    pub access: ConsoleAccess,
}

impl ConsoleUser {
    /// Role shown in the console header.
    #[must_use]
    pub const fn role(&self) -> ConsoleRole {
        match self.access {
            ConsoleAccess::Admin { .. } => ConsoleRole::Admin,
            ConsoleAccess::Seller { .. } => ConsoleRole::Seller,
        }
    }

    /// Whether this user can see every seller's records.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.access, ConsoleAccess::Admin { .. })
    }

    /// The user's own seller row, if any.
    #[must_use]
    pub const fn seller_id(&self) -> Option<SellerId> {
        match self.access {
            ConsoleAccess::Admin { seller_id } => seller_id,
            ConsoleAccess::Seller { seller_id } => Some(seller_id),
        }
    }

    /// The seller filter to apply to listings: `None` for admins.
    #[must_use]
    pub const fn scope(&self) -> Option<SellerId> {
        match self.access {
            ConsoleAccess::Admin { .. } => None,
            ConsoleAccess::Seller { seller_id } => Some(seller_id),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for the logged-in portal user.
    pub const PORTAL_USER: &str = "portal_user";

    /// Key for the logged-in console user.
    pub const CONSOLE_USER: &str = "console_user";

    /// Key for the keypad layout shown on the last login page render.
    pub const KEYPAD_LAYOUT: &str = "keypad_layout";
}
