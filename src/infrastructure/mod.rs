//! Infrastructure layer module
//!
//! Adapters behind the domain ports and the ambient services around them:
//! - Credential resolution (kubeconfig files, in-cluster service account)
//! - reqwest transport and request instrumentation
//! - Built-in backend clients and factories
//! - Configuration management
//! - Logging infrastructure

pub mod backends;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod transport;
