//! Application services
//!
//! - `ClientRegistry`: lazy, once-per-slot construction of backend clients

pub mod client_registry;

pub use client_registry::{ClientRegistry, ClientRegistryBuilder};
