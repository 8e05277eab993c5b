//! Core types for ClientDesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod keypad;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use keypad::{KeypadError, KeypadLayout, PIN_LENGTH, PinEntry};
pub use money::Money;
pub use status::*;
