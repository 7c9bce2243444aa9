//! Widgetry Engine library.
//!
//! The embedded-runtime side: component registry, buffer backend, the engine
//! end of the message bridge and the remote command protocol server.
//!
//! ## Structure
//!
//! - `use_cases/` - Component registry operations
//! - `infrastructure/` - Config, buffer backend, bridge adapters
//! - `api/` - TCP protocol entry point
//! - `app` - Application composition
//! - `run` - Binary bootstrap (logging, signals, server loop)

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod run;
pub mod use_cases;

pub use app::App;
pub use infrastructure::config::EngineConfig;
