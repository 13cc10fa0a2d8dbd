//! Domain models for the Meridian ERP Platform

mod batch;
mod inventory;
mod product;
mod warehouse;

pub use batch::*;
pub use inventory::*;
pub use product::*;
pub use warehouse::*;
