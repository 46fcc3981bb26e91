//! # Integration Flows
//!
//! Archive, seal, restart and replay over the file-backed store.

pub mod flows;
