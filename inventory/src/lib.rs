pub mod aggregate;
pub mod config;
pub mod defaults;
pub mod netbox;
pub mod redfish;
pub mod scanner;

pub use common::error::InventoryError;
