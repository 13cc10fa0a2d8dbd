//! Shared types and domain logic for the Meridian ERP Platform
//!
//! This crate contains the domain models and the pure parts of the inventory
//! core (batch cost math, allocation planning, validation) shared between the
//! backend and any other components of the system.

pub mod allocation;
pub mod costing;
pub mod models;
pub mod types;
pub mod validation;

pub use allocation::*;
pub use costing::*;
pub use models::*;
pub use types::*;
pub use validation::*;
