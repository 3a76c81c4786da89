//! Database document models
//!
//! Field names use the storefront's historical camelCase document
//! shape; ids are SurrealDB record ids serialized as `table:id`
//! strings for the API.

pub mod analytics;
pub mod customer;
pub mod order;
pub mod product;
pub mod serde_helpers;

pub use analytics::AnalyticsSummary;
pub use customer::{CustomerProfile, CustomerProfileUpsert};
pub use order::{Order, OrderContent, OrderEdit};
pub use product::{Product, ProductCreate, ProductUpdate};
