//! Component instance lifecycle
//!
//! ```text
//! Constructed -> Mounting -> Mounted <-> Updating
//!                               |
//!                          Destroying -> Destroyed
//! ```
//!
//! Every mutating entry point takes `&mut self`; the host is responsible for
//! serializing access to one instance (the engine keeps each behind its own
//! async mutex).

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::ComponentError;
use crate::ports::{events, BufferBackend, BufferHandle, ComponentEvent, ComponentLink};
use crate::reactive::ReactiveState;

/// Pure projection of state into buffer lines.
pub type RenderFn = fn(&ReactiveState) -> Vec<String>;

/// User callback invoked at a lifecycle transition.
pub type HookFn = Box<dyn FnMut(&HookContext<'_>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Constructed,
    Mounting,
    Mounted,
    Updating,
    Destroying,
    Destroyed,
}

impl LifecyclePhase {
    /// Mounted, possibly in the middle of an update.
    pub fn is_mounted(self) -> bool {
        matches!(self, Self::Mounted | Self::Updating)
    }
}

/// What a hook gets to look at.
pub struct HookContext<'a> {
    pub component_id: &'a str,
    pub name: &'a str,
    pub state: &'a ReactiveState,
}

/// Optional callbacks, fixed at construction.
#[derive(Default)]
pub struct LifecycleHooks {
    before_mount: Option<HookFn>,
    on_mounted: Option<HookFn>,
    on_updated: Option<HookFn>,
    on_before_destroy: Option<HookFn>,
    on_destroyed: Option<HookFn>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before_mount(mut self, f: impl FnMut(&HookContext<'_>) + Send + 'static) -> Self {
        self.before_mount = Some(Box::new(f));
        self
    }

    pub fn with_on_mounted(mut self, f: impl FnMut(&HookContext<'_>) + Send + 'static) -> Self {
        self.on_mounted = Some(Box::new(f));
        self
    }

    pub fn with_on_updated(mut self, f: impl FnMut(&HookContext<'_>) + Send + 'static) -> Self {
        self.on_updated = Some(Box::new(f));
        self
    }

    pub fn with_on_before_destroy(
        mut self,
        f: impl FnMut(&HookContext<'_>) + Send + 'static,
    ) -> Self {
        self.on_before_destroy = Some(Box::new(f));
        self
    }

    pub fn with_on_destroyed(mut self, f: impl FnMut(&HookContext<'_>) + Send + 'static) -> Self {
        self.on_destroyed = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("before_mount", &self.before_mount.is_some())
            .field("on_mounted", &self.on_mounted.is_some())
            .field("on_updated", &self.on_updated.is_some())
            .field("on_before_destroy", &self.on_before_destroy.is_some())
            .field("on_destroyed", &self.on_destroyed.is_some())
            .finish()
    }
}

/// Collaborators injected into every component.
#[derive(Clone)]
pub struct ComponentDeps {
    pub backend: Arc<dyn BufferBackend>,
    pub link: Arc<dyn ComponentLink>,
}

impl ComponentDeps {
    pub fn new(backend: Arc<dyn BufferBackend>, link: Arc<dyn ComponentLink>) -> Self {
        Self { backend, link }
    }
}

/// Generic stateful component bound to one buffer.
pub struct ComponentInstance {
    id: String,
    name: String,
    state: ReactiveState,
    hooks: LifecycleHooks,
    phase: LifecyclePhase,
    buffer: Option<BufferHandle>,
    render_fn: RenderFn,
    deps: ComponentDeps,
}

impl ComponentInstance {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        state: ReactiveState,
        render_fn: RenderFn,
        hooks: LifecycleHooks,
        deps: ComponentDeps,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state,
            hooks,
            phase: LifecyclePhase::Constructed,
            buffer: None,
            render_fn,
            deps,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.phase.is_mounted()
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase == LifecyclePhase::Destroyed
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn state(&self) -> &ReactiveState {
        &self.state
    }

    /// Fail with `Destroyed` once the instance is gone.
    pub fn ensure_alive(&self) -> Result<(), ComponentError> {
        if self.is_destroyed() {
            return Err(ComponentError::Destroyed(self.id.clone()));
        }
        Ok(())
    }

    /// Publish an event on behalf of this component.
    pub fn emit(&self, action: &str, payload: Value) {
        self.deps
            .link
            .emit(ComponentEvent::new(self.id.clone(), action, payload));
    }

    /// Allocate the buffer and show the first frame. No-op when already
    /// mounted or destroyed.
    pub fn mount(&mut self) -> Result<(), ComponentError> {
        if self.phase != LifecyclePhase::Constructed {
            return Ok(());
        }

        self.phase = LifecyclePhase::Mounting;
        self.run_hook(|h| &mut h.before_mount);

        let title = self
            .state
            .get_str("title")
            .unwrap_or_else(|| self.name.clone());
        let handle = match self.deps.backend.create(&self.id, &title) {
            Ok(handle) => handle,
            Err(e) => {
                self.phase = LifecyclePhase::Constructed;
                return Err(e.into());
            }
        };
        self.buffer = Some(handle);

        let lines = (self.render_fn)(&self.state);
        if let Err(e) = self.deps.backend.set_lines(handle, &lines) {
            tracing::warn!(component_id = %self.id, buffer = %handle, error = %e, "Initial render failed");
        }

        self.phase = LifecyclePhase::Mounted;
        self.run_hook(|h| &mut h.on_mounted);
        self.emit(events::MOUNTED, json!({ "name": self.name }));

        tracing::debug!(component_id = %self.id, name = %self.name, buffer = %handle, "Component mounted");
        Ok(())
    }

    /// Write the current state to the buffer. No-op unless mounted.
    pub fn render(&mut self) -> Result<(), ComponentError> {
        if !self.phase.is_mounted() {
            return Ok(());
        }
        let Some(handle) = self.buffer else {
            return Ok(());
        };

        let lines = (self.render_fn)(&self.state);
        self.deps.backend.set_lines(handle, &lines)?;
        self.run_hook(|h| &mut h.on_updated);
        Ok(())
    }

    /// Run several state writes followed by exactly one render.
    ///
    /// A failing closure still renders what it managed to write before the
    /// error is returned.
    pub fn batch<T>(
        &mut self,
        f: impl FnOnce(&mut ReactiveState) -> Result<T, ComponentError>,
    ) -> Result<T, ComponentError> {
        self.ensure_alive()?;

        let was_mounted = self.phase == LifecyclePhase::Mounted;
        if was_mounted {
            self.phase = LifecyclePhase::Updating;
        }

        let outcome = f(&mut self.state);

        if was_mounted {
            self.phase = LifecyclePhase::Mounted;
        }
        self.render()?;
        outcome
    }

    /// Apply a patch: one `set` per key, then one render.
    pub fn update_state(&mut self, patch: Map<String, Value>) -> Result<(), ComponentError> {
        self.batch(|state| {
            for (key, value) in patch {
                state.set(&key, value)?;
            }
            Ok(())
        })
    }

    /// Tear down. Returns `false` when already destroyed.
    pub fn destroy(&mut self) -> bool {
        if self.is_destroyed() {
            return false;
        }

        self.phase = LifecyclePhase::Destroying;
        self.run_hook(|h| &mut h.on_before_destroy);

        if let Some(handle) = self.buffer.take() {
            if let Err(e) = self.deps.backend.close(handle) {
                tracing::warn!(component_id = %self.id, buffer = %handle, error = %e, "Failed to release buffer, continuing destroy");
            }
        }
        self.deps.link.detach(&self.id);

        self.phase = LifecyclePhase::Destroyed;
        self.run_hook(|h| &mut h.on_destroyed);
        self.emit(events::DESTROYED, json!({ "name": self.name }));

        tracing::debug!(component_id = %self.id, "Component destroyed");
        true
    }

    fn run_hook(&mut self, slot: impl FnOnce(&mut LifecycleHooks) -> &mut Option<HookFn>) {
        if let Some(hook) = slot(&mut self.hooks) {
            let ctx = HookContext {
                component_id: &self.id,
                name: &self.name,
                state: &self.state,
            };
            hook(&ctx);
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("buffer", &self.buffer)
            .field("state", &self.state)
            .finish()
    }
}
