//! API layer - TCP protocol entry point.

pub mod connections;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod protocol_tests;

pub use connections::{ConnectionInfo, ConnectionManager};
pub use server::serve;
