//! # Ports Layer
//!
//! Defines the port traits for the Finality Archive subsystem.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving ports (API exposed to consensus and operators)
//! - `outbound.rs` - Driven ports (key-value store, content hasher)

pub mod inbound;
pub mod outbound;
