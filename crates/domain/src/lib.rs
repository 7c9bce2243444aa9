//! Widgetry domain: reactive state, component lifecycle and the Select widget.
//!
//! Everything here is synchronous. Hosts provide a [`BufferBackend`] for the
//! buffer/window primitives and a [`ComponentLink`] to receive events.

pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod ports;
pub mod reactive;
pub mod select;
pub mod widget;

pub use error::ComponentError;
pub use ids::{generate_component_id, ConnectionId, CorrelationId};
pub use lifecycle::{
    ComponentDeps, ComponentInstance, HookContext, HookFn, LifecycleHooks, LifecyclePhase,
    RenderFn,
};
pub use ports::{
    BufferBackend, BufferError, BufferHandle, ComponentEvent, ComponentLink, DetachedLink,
};
pub use reactive::{ReactiveState, WatchDisposer};
pub use select::{Select, SelectMethod, SelectOption};
pub use widget::{create_widget, Widget, WIDGET_TYPES};
