//! Order placement
//!
//! The checkout flow: validation, slip upload, code allocation, the
//! atomic create transaction and the post-commit notifications.

pub mod service;

pub use service::{CheckoutRequest, CheckoutService, SlipUpload, MAX_SLIP_BYTES};
