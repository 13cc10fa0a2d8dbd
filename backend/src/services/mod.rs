//! Business logic services for the Meridian ERP Platform

pub mod allocation;
pub mod batch;
pub mod inventory;
pub mod numbering;
pub mod product;
pub mod warehouse;

pub use allocation::AllocationService;
pub use batch::BatchService;
pub use inventory::InventoryService;
pub use numbering::NumberingService;
pub use product::ProductService;
pub use warehouse::WarehouseService;
