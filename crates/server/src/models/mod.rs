//! Domain models for ClientDesk.
//!
//! Rows of the managed database as the rest of the server sees them, plus
//! the identities stored in the session.

pub mod chat;
pub mod customer;
pub mod product;
pub mod seller;
pub mod session;

pub use chat::{ChatMessage, NewChatMessage};
pub use customer::{Client, Lead};
pub use product::{Product, ProductSync};
pub use seller::{EmailSignature, NewSeller, Seller};
pub use session::{ConsoleAccess, ConsoleUser, PortalUser, keys as session_keys};
