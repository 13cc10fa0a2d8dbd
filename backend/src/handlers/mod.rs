//! HTTP handlers for the Meridian ERP Platform

pub mod batch;
pub mod health;
pub mod inventory;
pub mod product;
pub mod warehouse;

pub use batch::*;
pub use health::*;
pub use inventory::*;
pub use product::*;
pub use warehouse::*;
