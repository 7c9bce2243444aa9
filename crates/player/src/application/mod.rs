//! Host-side component proxies.

pub mod remote_component;
pub mod remote_select;

pub use remote_component::RemoteComponent;
pub use remote_select::RemoteSelect;
