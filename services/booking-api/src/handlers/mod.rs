//! REST API handlers

pub mod availability;
pub mod bookings;
pub mod checkout;
pub mod health;
pub mod reservations;
pub mod shared;
pub mod webhook;

pub use availability::*;
pub use bookings::*;
pub use checkout::*;
pub use health::*;
pub use reservations::*;
pub use webhook::*;
