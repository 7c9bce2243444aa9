//! Reactive state container
//!
//! Plain fields hold JSON values. Computed fields are pure functions of the
//! current state, re-evaluated on every read. Watchers observe plain fields and
//! run synchronously inside `set`, in registration order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::{Map, Value};

use crate::error::ComponentError;

/// Derived field: a pure function of the current state.
pub type ComputedFn = Box<dyn Fn(&ReactiveState) -> Value + Send + Sync>;

/// Field observer, called with `(new, previous)`.
pub type WatchFn = Box<dyn FnMut(&Value, &Value) -> Result<(), ComponentError> + Send>;

#[derive(Default)]
pub struct ReactiveState {
    values: Map<String, Value>,
    computed: BTreeMap<String, ComputedFn>,
    watchers: HashMap<String, Vec<(u64, WatchFn)>>,
    next_watch_id: u64,
}

/// Token returned by [`ReactiveState::watch`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "dropping the disposer leaves the watcher registered forever"]
pub struct WatchDisposer {
    field: String,
    id: u64,
}

impl WatchDisposer {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Remove the watcher. Returns `false` if it was already gone.
    pub fn dispose(self, state: &mut ReactiveState) -> bool {
        let Some(list) = state.watchers.get_mut(&self.field) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != self.id);
        let removed = list.len() != before;
        if list.is_empty() {
            state.watchers.remove(&self.field);
        }
        removed
    }
}

impl ReactiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed plain fields without triggering watchers.
    pub fn with_values(values: Map<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Read a field. Computed fields are evaluated now; missing fields read as null.
    pub fn get(&self, key: &str) -> Value {
        if let Some(f) = self.computed.get(key) {
            return f(self);
        }
        self.values.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Store a plain field and run its watchers.
    ///
    /// Returns the previous value. The first failing watcher aborts the
    /// remaining ones; the new value stays stored.
    pub fn set(&mut self, key: &str, value: Value) -> Result<Value, ComponentError> {
        if self.computed.contains_key(key) {
            return Err(ComponentError::validation(format!(
                "'{key}' is a computed field and cannot be assigned"
            )));
        }

        let previous = self
            .values
            .insert(key.to_string(), value)
            .unwrap_or(Value::Null);

        if let Some(list) = self.watchers.get_mut(key) {
            let current = self.values.get(key).unwrap_or(&Value::Null);
            for (_, watcher) in list.iter_mut() {
                watcher(current, &previous)?;
            }
        }

        Ok(previous)
    }

    pub fn watch(
        &mut self,
        key: impl Into<String>,
        callback: impl FnMut(&Value, &Value) -> Result<(), ComponentError> + Send + 'static,
    ) -> WatchDisposer {
        let field = key.into();
        let id = self.next_watch_id;
        self.next_watch_id += 1;
        self.watchers
            .entry(field.clone())
            .or_default()
            .push((id, Box::new(callback)));
        WatchDisposer { field, id }
    }

    pub fn computed(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&ReactiveState) -> Value + Send + Sync + 'static,
    ) {
        self.computed.insert(name.into(), Box::new(f));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key) || self.computed.contains_key(key)
    }

    pub fn is_computed(&self, key: &str) -> bool {
        self.computed.contains_key(key)
    }

    pub fn watcher_count(&self, key: &str) -> usize {
        self.watchers.get(key).map_or(0, Vec::len)
    }

    /// Stored and computed fields as one JSON object.
    pub fn snapshot(&self) -> Map<String, Value> {
        let mut out = self.values.clone();
        for (name, f) in &self.computed {
            out.insert(name.clone(), f(self));
        }
        out
    }

    // -------------------------------------------------------------------------
    // Typed helpers
    // -------------------------------------------------------------------------

    /// Boolean field; anything that is not `true` reads as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).as_bool().unwrap_or(false)
    }

    /// Non-negative integer field.
    pub fn get_index(&self, key: &str) -> Option<usize> {
        self.get(key).as_u64().and_then(|n| usize::try_from(n).ok())
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for ReactiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveState")
            .field("values", &self.values)
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field(
                "watchers",
                &self
                    .watchers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.len()))
                    .collect::<BTreeMap<_, _>>(),
            )
            .finish()
    }
}
