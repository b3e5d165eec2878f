//! Top-level facade crate for gripwire.
//!
//! Re-exports the protocol core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use gripwire_core::*;
}

pub mod gateway {
    pub use gripwire_gateway::*;
}
