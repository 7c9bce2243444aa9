//! Object-safe component facade used by registries and bridges

use serde_json::{Map, Value};

use crate::error::ComponentError;
use crate::lifecycle::ComponentDeps;
use crate::select::{self, Select, SelectMethod};

/// Component names `create_widget` knows how to build.
pub const WIDGET_TYPES: &[&str] = &[select::NAME];

pub trait Widget: Send {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Callable method names, in a stable order.
    fn methods(&self) -> &'static [&'static str];

    fn mount(&mut self) -> Result<(), ComponentError>;

    fn call_method(&mut self, method: &str, args: &[Value]) -> Result<Value, ComponentError>;

    fn update_state(&mut self, patch: Map<String, Value>) -> Result<(), ComponentError>;

    fn set_props(&mut self, props: &Map<String, Value>) -> Result<(), ComponentError>;

    fn state(&self) -> Result<Value, ComponentError>;

    /// `false` when already destroyed.
    fn destroy(&mut self) -> bool;

    fn is_destroyed(&self) -> bool;
}

impl Widget for Select {
    fn id(&self) -> &str {
        Select::id(self)
    }

    fn name(&self) -> &str {
        select::NAME
    }

    fn methods(&self) -> &'static [&'static str] {
        SelectMethod::NAMES
    }

    fn mount(&mut self) -> Result<(), ComponentError> {
        Select::mount(self)
    }

    fn call_method(&mut self, method: &str, args: &[Value]) -> Result<Value, ComponentError> {
        self.instance().ensure_alive()?;
        let method = SelectMethod::parse(method, args)?;
        self.call(method)
    }

    fn update_state(&mut self, patch: Map<String, Value>) -> Result<(), ComponentError> {
        Select::update_state(self, patch)
    }

    fn set_props(&mut self, props: &Map<String, Value>) -> Result<(), ComponentError> {
        Select::set_props(self, props)
    }

    fn state(&self) -> Result<Value, ComponentError> {
        self.state_snapshot()
    }

    fn destroy(&mut self) -> bool {
        Select::destroy(self)
    }

    fn is_destroyed(&self) -> bool {
        Select::is_destroyed(self)
    }
}

/// Build an unmounted component by name.
pub fn create_widget(
    name: &str,
    id: &str,
    props: &Map<String, Value>,
    deps: ComponentDeps,
) -> Result<Box<dyn Widget>, ComponentError> {
    match name {
        select::NAME => Ok(Box::new(Select::new(id, props, deps)?)),
        other => Err(ComponentError::UnsupportedType(other.to_string())),
    }
}
