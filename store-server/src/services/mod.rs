//! External collaborators behind traits
//!
//! Mail delivery and blob storage sit behind object-safe traits so
//! handlers and tests never depend on the network or the filesystem
//! layout directly.

pub mod blob;
pub mod email;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use email::{LogMailer, Mailer, OutgoingEmail, SendgridMailer};
