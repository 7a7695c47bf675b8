//! Port trait definitions (Hexagonal Architecture)
//!
//! - Transport: sends one API request to a backend and returns its response
//!
//! Backend clients only ever talk to a `dyn Transport`, which lets the
//! resolver decorate the primary transport with instrumentation.

pub mod transport;

pub use transport::Transport;
