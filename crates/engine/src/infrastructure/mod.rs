//! Infrastructure implementations.
//!
//! Contains port trait implementations for the component runtime.

pub mod bridge_link;
pub mod buffers;
pub mod config;
