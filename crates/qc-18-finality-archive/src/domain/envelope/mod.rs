//! # Envelope Module
//!
//! Fixed binary framing for every archived segment:
//!
//! ```text
//! [8 bytes length LE][32 bytes checksum][N bytes compressed-or-raw payload]
//! ```

mod codec;
pub mod security;


// Re-export public types
pub use codec::{EnvelopeCodec, EnvelopeHeader};
