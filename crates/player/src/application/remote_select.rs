//! Typed host-side proxy for a Select living in the engine.

use std::sync::Arc;

use serde_json::{json, Value};
use widgetry_domain::SelectOption;
use widgetry_shared::MessageBridge;

use super::remote_component::RemoteComponent;
use crate::error::RemoteError;
use crate::infrastructure::messaging::EventBus;

#[derive(Debug, Clone)]
pub struct RemoteSelect {
    component: RemoteComponent,
}

impl RemoteSelect {
    pub fn new(id: impl Into<String>, bridge: Arc<MessageBridge>) -> Self {
        Self {
            component: RemoteComponent::new(id, bridge),
        }
    }

    pub fn id(&self) -> &str {
        self.component.id()
    }

    pub fn component(&self) -> &RemoteComponent {
        &self.component
    }

    pub fn listen(&self, events: &EventBus) {
        self.component.listen(events);
    }

    // -------------------------------------------------------------------------
    // Open / close
    // -------------------------------------------------------------------------

    /// `false` when the select is disabled.
    pub async fn open(&self) -> Result<bool, RemoteError> {
        self.call_bool("open", vec![]).await
    }

    pub async fn close(&self) -> Result<bool, RemoteError> {
        self.call_bool("close", vec![]).await
    }

    pub async fn toggle(&self) -> Result<bool, RemoteError> {
        self.call_bool("toggle", vec![]).await
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    pub async fn focus_option(&self, index: i64) -> Result<bool, RemoteError> {
        self.call_bool("focus_option", vec![json!(index)]).await
    }

    pub async fn focus_next_option(&self) -> Result<bool, RemoteError> {
        self.call_bool("focus_next_option", vec![]).await
    }

    pub async fn focus_prev_option(&self) -> Result<bool, RemoteError> {
        self.call_bool("focus_prev_option", vec![]).await
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub async fn select_option(&self, index: i64) -> Result<bool, RemoteError> {
        self.call_bool("select_option", vec![json!(index)]).await
    }

    pub async fn select_by_value(&self, value: Value) -> Result<bool, RemoteError> {
        self.call_bool("select_by_value", vec![value]).await
    }

    pub async fn select_focused_option(&self) -> Result<bool, RemoteError> {
        self.call_bool("select_focused_option", vec![]).await
    }

    pub async fn clear_selection(&self) -> Result<bool, RemoteError> {
        self.call_bool("clear_selection", vec![]).await
    }

    /// Selected option (single mode) or list of options (multi mode).
    pub async fn get_selected(&self) -> Result<Value, RemoteError> {
        self.component.call_method("get_selected", vec![]).await
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    pub async fn set_disabled(&self, disabled: bool) -> Result<bool, RemoteError> {
        self.call_bool("set_disabled", vec![json!(disabled)]).await
    }

    pub async fn update_options(&self, options: &[SelectOption]) -> Result<bool, RemoteError> {
        self.call_bool("update_options", vec![json!(options)]).await
    }

    /// Number of matching options.
    pub async fn search(&self, query: &str) -> Result<usize, RemoteError> {
        let value = self.component.call_method("search", vec![json!(query)]).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| RemoteError::unexpected("search", value))
    }

    pub async fn state(&self) -> Result<Value, RemoteError> {
        self.component.get_state().await
    }

    pub async fn is_open(&self) -> Result<bool, RemoteError> {
        let state = self.state().await?;
        Ok(state["is_open"].as_bool().unwrap_or(false))
    }

    async fn call_bool(&self, method: &str, args: Vec<Value>) -> Result<bool, RemoteError> {
        let value = self.component.call_method(method, args).await?;
        value
            .as_bool()
            .ok_or_else(|| RemoteError::unexpected(method, value))
    }
}
