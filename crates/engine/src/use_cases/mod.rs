//! Use cases - user-facing operations over the component registry.

pub mod components;

pub use components::{ComponentService, ComponentServiceError, LoadedComponent};
