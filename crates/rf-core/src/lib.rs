//! rusty-forum/crates/rf-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Forum:
//! the topic/post/comment aggregate with its invariants, the error
//! taxonomy, the external ports, and the authorization gate.

pub mod auth;
pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use auth::*;
pub use error::*;
pub use models::*;
pub use traits::*;
