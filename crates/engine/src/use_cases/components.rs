//! Component registry use cases.
//!
//! One registry per engine, shared by every protocol connection and by the
//! bridge handlers. Each instance sits behind its own async mutex so calls on
//! one component are serialized while different components run concurrently.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use widgetry_domain::{
    create_widget, generate_component_id, BufferBackend, ComponentDeps, ComponentError,
    ComponentLink, Widget, WIDGET_TYPES,
};
use widgetry_protocol::ErrorCode;
use widgetry_shared::MessageBridge;

use crate::infrastructure::bridge_link::ComponentHandler;

type SharedWidget = Arc<Mutex<Box<dyn Widget>>>;

#[derive(Debug, thiserror::Error)]
pub enum ComponentServiceError {
    #[error(transparent)]
    Component(#[from] ComponentError),
    #[error("Component already exists: {0}")]
    Exists(String),
}

impl ComponentServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Component(e) => e.code(),
            Self::Exists(_) => ErrorCode::ComponentExists,
        }
    }
}

/// What a successful load hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedComponent {
    pub component_id: String,
    pub name: String,
    pub methods: Vec<String>,
}

pub struct ComponentService {
    components: DashMap<String, SharedWidget>,
    backend: Arc<dyn BufferBackend>,
    link: Arc<dyn ComponentLink>,
    bridge: Arc<MessageBridge>,
}

impl ComponentService {
    pub fn new(
        backend: Arc<dyn BufferBackend>,
        link: Arc<dyn ComponentLink>,
        bridge: Arc<MessageBridge>,
    ) -> Self {
        Self {
            components: DashMap::new(),
            backend,
            link,
            bridge,
        }
    }

    /// Create, mount and register a component.
    ///
    /// An existing id is refused unless `force` is set, in which case the old
    /// instance is destroyed once the new props have been validated.
    pub async fn load(
        self: &Arc<Self>,
        name: &str,
        component_id: Option<String>,
        force: bool,
        props: &Map<String, Value>,
    ) -> Result<LoadedComponent, ComponentServiceError> {
        if !WIDGET_TYPES.contains(&name) {
            return Err(ComponentError::UnsupportedType(name.to_string()).into());
        }

        let component_id = component_id.unwrap_or_else(|| generate_component_id(name));

        let exists = self.components.contains_key(&component_id);
        if exists && !force {
            return Err(ComponentServiceError::Exists(component_id));
        }

        // Construction validates the props and has no side effects
        let deps = ComponentDeps::new(Arc::clone(&self.backend), Arc::clone(&self.link));
        let mut widget = create_widget(name, &component_id, props, deps)?;
        let methods = widget.methods().iter().map(|m| m.to_string()).collect();

        if exists {
            tracing::debug!(component_id = %component_id, "Replacing existing component");
            // Someone else may have unloaded it in the meantime
            let _ = self.unload(&component_id).await;
        }

        match self.components.entry(component_id.clone()) {
            // Lost a race with another load of the same id; ours was never mounted
            Entry::Occupied(_) => return Err(ComponentServiceError::Exists(component_id)),
            Entry::Vacant(slot) => {
                widget.mount()?;
                slot.insert(Arc::new(Mutex::new(widget)));
            }
        }

        self.register_handler(&component_id);

        tracing::info!(component_id = %component_id, name = %name, "Component loaded");

        Ok(LoadedComponent {
            component_id,
            name: name.to_string(),
            methods,
        })
    }

    pub async fn call_method(
        &self,
        component_id: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ComponentError> {
        let widget = self.get(component_id)?;
        let mut widget = widget.lock().await;
        let result = widget.call_method(method, args);
        if let Err(e) = &result {
            tracing::debug!(component_id = %component_id, method = %method, error = %e, "Method call failed");
        }
        result
    }

    pub async fn get_state(&self, component_id: &str) -> Result<Value, ComponentError> {
        let widget = self.get(component_id)?;
        let widget = widget.lock().await;
        widget.state()
    }

    /// Apply props. Anything but a JSON object is an invalid argument.
    pub async fn set_props(&self, component_id: &str, props: &Value) -> Result<(), ComponentError> {
        let widget = self.get(component_id)?;
        let Value::Object(props) = props else {
            return Err(ComponentError::validation("props must be an object"));
        };
        let mut widget = widget.lock().await;
        widget.set_props(props)
    }

    pub async fn update_state(
        &self,
        component_id: &str,
        patch: Map<String, Value>,
    ) -> Result<(), ComponentError> {
        let widget = self.get(component_id)?;
        let mut widget = widget.lock().await;
        widget.update_state(patch)
    }

    /// Destroy and forget one component.
    pub async fn unload(&self, component_id: &str) -> Result<(), ComponentError> {
        let (_, widget) = self
            .components
            .remove(component_id)
            .ok_or_else(|| ComponentError::NotFound(component_id.to_string()))?;

        widget.lock().await.destroy();
        self.bridge.unregister_handler(component_id);
        tracing::info!(component_id = %component_id, "Component unloaded");
        Ok(())
    }

    /// Destroy every component. Returns how many were removed.
    pub async fn clean_all(&self) -> usize {
        let ids: Vec<String> = self.components.iter().map(|e| e.key().clone()).collect();
        let mut count = 0;
        for id in ids {
            if self.unload(&id).await.is_ok() {
                count += 1;
            }
        }
        if count > 0 {
            tracing::info!(count, "Cleaned all components");
        }
        count
    }

    pub fn contains(&self, component_id: &str) -> bool {
        self.components.contains_key(component_id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.components.iter().map(|e| e.key().clone()).collect()
    }

    // Clone out of the map so no shard lock is held across the instance lock
    fn get(&self, component_id: &str) -> Result<SharedWidget, ComponentError> {
        self.components
            .get(component_id)
            .map(|w| Arc::clone(w.value()))
            .ok_or_else(|| ComponentError::NotFound(component_id.to_string()))
    }

    fn register_handler(self: &Arc<Self>, component_id: &str) {
        self.bridge.register_handler(
            component_id,
            Arc::new(ComponentHandler::new(Arc::downgrade(self), component_id)),
        );
    }
}
