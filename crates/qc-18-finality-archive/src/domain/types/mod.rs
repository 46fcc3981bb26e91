//! # Value Objects
//!
//! Configuration and key layout for the Finality Archive.
//!
//! ## Module Structure
//!
//! - `config` - ArchiveConfig, AppendPolicy, WriteMode
//! - `keys` - Namespace and key encoding

mod config;
mod keys;


pub use config::{AppendPolicy, ArchiveConfig, WriteMode};
pub use keys::{decode_id_key, segment_key, Namespace};
