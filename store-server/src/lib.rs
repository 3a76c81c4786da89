//! Store Server - candle storefront backend
//!
//! # Architecture
//!
//! The order lifecycle and inventory subsystem of a
//! direct-to-consumer candle shop. Checkout attaches a bank-transfer
//! slip; every order carries a unique sequential code customers put
//! in the transfer remark.
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # Config, state, server
//! ├── auth/          # JWT verification, caller resolution
//! ├── db/            # Embedded SurrealDB, models, repositories
//! ├── orders/        # Checkout service (atomic create flow)
//! ├── notify/        # Fire-and-forget email triggers
//! ├── services/      # External collaborators (mail, blob store)
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Errors, logging
//! ```
//!
//! All cross-entity invariants (never-reused order codes, non-negative
//! stock, analytics counters matching order state) are enforced with
//! SurrealDB transactions, never in-process locks: each request
//! handler is stateless and may run concurrently with any other.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export common types
pub use auth::{Identity, JwtService, Role};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};
pub use utils::logger::init_logger;
