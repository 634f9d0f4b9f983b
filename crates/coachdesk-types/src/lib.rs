//! CoachDesk Types - Shared domain types
//!
//! This crate contains domain types used across CoachDesk crates:
//! - Identifiers and booking tokens
//! - Products and their pricing
//! - Reservations (slot holds), transactions and bookings
//! - Business hours, busy slots and time windows

pub mod booking;
pub mod error;
pub mod ids;
pub mod product;
pub mod reservation;
pub mod schedule;
pub mod transaction;

pub use booking::*;
pub use error::*;
pub use ids::*;
pub use product::*;
pub use reservation::*;
pub use schedule::*;
pub use transaction::*;
