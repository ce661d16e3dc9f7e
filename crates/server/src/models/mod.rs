//! Domain models for the inventory service.

pub mod catalog;
pub mod stock;
pub mod transaction;

pub use catalog::{ComboComponent, ComboProduct, PackagingRequirement, Product, ProductKind, Warehouse};
pub use stock::{ComboStockRecord, StockRecord, WarehouseSummary};
pub use transaction::{
    BatchShipment, InventoryTransaction, NewTransaction, TransactionFilter, TransactionItem,
};
