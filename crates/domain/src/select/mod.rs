//! Select dropdown
//!
//! Closed/Open state machine with focus navigation and single or multi
//! selection. All state lives in the instance's `ReactiveState`; every
//! operation is one batch, so one render.
//!
//! Focus navigation clamps at both ends. With no current focus, `next` lands on
//! the first option and `prev` on the last. Indices left stale by an options
//! replacement read back as null.

mod method;
mod option;
mod render;

pub use method::SelectMethod;
pub use option::{parse_options, SelectOption};
pub use render::{render, DEFAULT_PLACEHOLDER};

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::ComponentError;
use crate::lifecycle::{ComponentDeps, ComponentInstance, LifecycleHooks};
use crate::ports::{ComponentEvent, ComponentLink};
use crate::reactive::ReactiveState;

/// Registered component name
pub const NAME: &str = "Select";

/// State field names
pub mod fields {
    pub const OPTIONS: &str = "options";
    pub const IS_OPEN: &str = "is_open";
    pub const DISABLED: &str = "disabled";
    pub const MULTI: &str = "multi";
    pub const FOCUSED_OPTION_INDEX: &str = "focused_option_index";
    pub const SELECTED_OPTION_INDEX: &str = "selected_option_index";
    pub const SELECTED_VALUE: &str = "selected_value";
    pub const SELECTED_TEXT: &str = "selected_text";
    pub const SELECTED_OPTIONS: &str = "selected_options";
    pub const PLACEHOLDER: &str = "placeholder";
    pub const TITLE: &str = "title";
    pub const SEARCH_QUERY: &str = "search_query";

    // Computed
    pub const HAS_SELECTION: &str = "has_selection";
    pub const OPTION_COUNT: &str = "option_count";
}

/// Event names
pub mod events {
    pub const OPENED: &str = "select:opened";
    pub const CLOSED: &str = "select:closed";
    pub const OPTION_SELECTED: &str = "select:option_selected";
    pub const OPTION_DESELECTED: &str = "select:option_deselected";
}

// =============================================================================
// State helpers (shared with the renderer)
// =============================================================================

/// Typed view of the options field. Entries that are not objects are skipped.
pub(crate) fn options_of(state: &ReactiveState) -> Vec<SelectOption> {
    match state.get(fields::OPTIONS) {
        Value::Array(items) => items
            .iter()
            .filter_map(|raw| SelectOption::from_json(raw).ok())
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn selected_options_of(state: &ReactiveState) -> Vec<SelectOption> {
    match state.get(fields::SELECTED_OPTIONS) {
        Value::Array(items) => items
            .iter()
            .filter_map(|raw| SelectOption::from_json(raw).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Index field, or `None` when unset or out of range for `len`.
pub(crate) fn index_within(state: &ReactiveState, field: &str, len: usize) -> Option<usize> {
    state.get_index(field).filter(|i| *i < len)
}

/// Indices of the options the current search query lets through, in order.
pub(crate) fn visible_indices(state: &ReactiveState, options: &[SelectOption]) -> Vec<usize> {
    let query = state.get_str(fields::SEARCH_QUERY).unwrap_or_default();
    options
        .iter()
        .enumerate()
        .filter(|(_, o)| query.is_empty() || o.matches(&query))
        .map(|(i, _)| i)
        .collect()
}

/// Bring the selection fields in line with the current option list.
///
/// Single mode: an index past the end clears index, value and text; a valid
/// index takes value and text from the option now at that position. Multi
/// mode: entries no longer present are dropped.
fn reconcile_selection(state: &mut ReactiveState) -> Result<(), ComponentError> {
    let options = options_of(state);

    let chosen = selected_options_of(state);
    let kept: Vec<&SelectOption> = chosen
        .iter()
        .filter(|c| options.iter().any(|o| o.same_entry(c)))
        .collect();
    if kept.len() != chosen.len() {
        state.set(fields::SELECTED_OPTIONS, to_json(&kept)?)?;
    }

    if state.get(fields::SELECTED_OPTION_INDEX).is_null() {
        return Ok(());
    }
    match index_within(state, fields::SELECTED_OPTION_INDEX, options.len()) {
        Some(i) => {
            state.set(fields::SELECTED_VALUE, options[i].value.clone())?;
            state.set(fields::SELECTED_TEXT, Value::String(options[i].text.clone()))?;
        }
        None => {
            state.set(fields::SELECTED_OPTION_INDEX, Value::Null)?;
            state.set(fields::SELECTED_VALUE, Value::Null)?;
            state.set(fields::SELECTED_TEXT, Value::Null)?;
        }
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(|e| ComponentError::validation(e.to_string()))
}

// =============================================================================
// Select
// =============================================================================

pub struct Select {
    inner: ComponentInstance,
}

impl Select {
    pub fn new(
        id: impl Into<String>,
        props: &Map<String, Value>,
        deps: ComponentDeps,
    ) -> Result<Self, ComponentError> {
        Self::with_hooks(id, props, LifecycleHooks::default(), deps)
    }

    pub fn with_hooks(
        id: impl Into<String>,
        props: &Map<String, Value>,
        hooks: LifecycleHooks,
        deps: ComponentDeps,
    ) -> Result<Self, ComponentError> {
        let id = id.into();
        let validated = validate_props(props)?;

        let mut state = initial_state();
        for (key, value) in validated {
            state.set(&key, value)?;
        }
        // Registered after the props so loading an open dropdown is silent
        let _open_watcher = watch_open_state(&mut state, id.clone(), deps.link.clone());

        let inner = ComponentInstance::new(id, NAME, state, render, hooks, deps);
        Ok(Self { inner })
    }

    pub fn instance(&self) -> &ComponentInstance {
        &self.inner
    }

    pub fn id(&self) -> &str {
        self.inner.id()
    }

    pub fn mount(&mut self) -> Result<(), ComponentError> {
        self.inner.mount()
    }

    pub fn destroy(&mut self) -> bool {
        self.inner.destroy()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    fn reactive(&self) -> &ReactiveState {
        self.inner.state()
    }

    fn options(&self) -> Vec<SelectOption> {
        options_of(self.reactive())
    }

    pub fn is_open(&self) -> bool {
        self.reactive().get_bool(fields::IS_OPEN)
    }

    pub fn is_multi(&self) -> bool {
        self.reactive().get_bool(fields::MULTI)
    }

    pub fn focused_index(&self) -> Option<usize> {
        index_within(self.reactive(), fields::FOCUSED_OPTION_INDEX, self.options().len())
    }

    pub fn selected_index(&self) -> Option<usize> {
        index_within(self.reactive(), fields::SELECTED_OPTION_INDEX, self.options().len())
    }

    // -------------------------------------------------------------------------
    // Open / close
    // -------------------------------------------------------------------------

    /// Declined (`false`) while disabled.
    pub fn open(&mut self) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        if self.reactive().get_bool(fields::DISABLED) {
            tracing::debug!(component_id = %self.id(), "Open declined, select is disabled");
            return Ok(false);
        }
        self.inner
            .batch(|s| s.set(fields::IS_OPEN, Value::Bool(true)))?;
        Ok(true)
    }

    pub fn close(&mut self) -> Result<bool, ComponentError> {
        self.inner
            .batch(|s| s.set(fields::IS_OPEN, Value::Bool(false)))?;
        Ok(true)
    }

    pub fn toggle(&mut self) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        if self.is_open() {
            self.close()
        } else {
            self.open()
        }
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    pub fn focus_option(&mut self, index: i64) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        let len = self.options().len();
        let Some(index) = usize::try_from(index).ok().filter(|i| *i < len) else {
            return Ok(false);
        };
        self.inner
            .batch(|s| s.set(fields::FOCUSED_OPTION_INDEX, json!(index)))?;
        Ok(true)
    }

    pub fn focus_next_option(&mut self) -> Result<bool, ComponentError> {
        self.move_focus(|visible, current| match current {
            None => visible.first().copied(),
            Some(c) => visible
                .iter()
                .copied()
                .find(|i| *i > c)
                .or_else(|| visible.last().copied()),
        })
    }

    pub fn focus_prev_option(&mut self) -> Result<bool, ComponentError> {
        self.move_focus(|visible, current| match current {
            None => visible.last().copied(),
            Some(c) => visible
                .iter()
                .rev()
                .copied()
                .find(|i| *i < c)
                .or_else(|| visible.first().copied()),
        })
    }

    /// Step through the options the search filter shows. `step` gets the
    /// visible indices (never empty) and the current focus.
    fn move_focus(
        &mut self,
        step: impl FnOnce(&[usize], Option<usize>) -> Option<usize>,
    ) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        let options = self.options();
        let visible = visible_indices(self.reactive(), &options);
        if visible.is_empty() {
            return Ok(false);
        }
        let Some(next) = step(&visible, self.focused_index()) else {
            return Ok(false);
        };
        self.inner
            .batch(|s| s.set(fields::FOCUSED_OPTION_INDEX, json!(next)))?;
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn select_option(&mut self, index: i64) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        let options = self.options();
        let Some(index) = usize::try_from(index).ok().filter(|i| *i < options.len()) else {
            return Ok(false);
        };
        let option = options[index].clone();

        if self.is_multi() {
            let mut chosen = selected_options_of(self.reactive());
            let removed = match chosen.iter().position(|c| c.same_entry(&option)) {
                Some(pos) => {
                    chosen.remove(pos);
                    true
                }
                None => {
                    chosen.push(option.clone());
                    false
                }
            };
            let chosen = to_json(&chosen)?;
            self.inner
                .batch(|s| s.set(fields::SELECTED_OPTIONS, chosen))?;

            let action = if removed {
                events::OPTION_DESELECTED
            } else {
                events::OPTION_SELECTED
            };
            self.inner
                .emit(action, json!({ "index": index, "value": option.value }));
            return Ok(true);
        }

        self.inner.batch(|s| {
            s.set(fields::SELECTED_OPTION_INDEX, json!(index))?;
            s.set(fields::SELECTED_VALUE, option.value.clone())?;
            s.set(fields::SELECTED_TEXT, Value::String(option.text.clone()))?;
            s.set(fields::IS_OPEN, Value::Bool(false))
        })?;
        self.inner.emit(
            events::OPTION_SELECTED,
            json!({ "index": index, "value": option.value }),
        );
        Ok(true)
    }

    /// First option whose value equals `value`.
    pub fn select_by_value(&mut self, value: &Value) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        match self.options().iter().position(|o| &o.value == value) {
            Some(index) => self.select_option(index as i64),
            None => Ok(false),
        }
    }

    /// Declined when nothing is focused or the focused option is filtered out.
    pub fn select_focused_option(&mut self) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        let visible = visible_indices(self.reactive(), &self.options());
        match self.focused_index() {
            Some(index) if visible.contains(&index) => self.select_option(index as i64),
            _ => Ok(false),
        }
    }

    pub fn clear_selection(&mut self) -> Result<bool, ComponentError> {
        self.inner.batch(|s| {
            s.set(fields::SELECTED_OPTION_INDEX, Value::Null)?;
            s.set(fields::SELECTED_VALUE, Value::Null)?;
            s.set(fields::SELECTED_TEXT, Value::Null)?;
            s.set(fields::SELECTED_OPTIONS, json!([]))
        })?;
        Ok(true)
    }

    /// Single: `{index, value, text}` or null. Multi: the selected options.
    pub fn get_selected(&self) -> Result<Value, ComponentError> {
        self.inner.ensure_alive()?;
        if self.is_multi() {
            return to_json(&selected_options_of(self.reactive()));
        }
        let options = self.options();
        Ok(match self.selected_index() {
            Some(i) => json!({
                "index": i,
                "value": options[i].value,
                "text": options[i].text,
            }),
            None => Value::Null,
        })
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Does not close an open dropdown.
    pub fn set_disabled(&mut self, disabled: bool) -> Result<bool, ComponentError> {
        self.inner
            .batch(|s| s.set(fields::DISABLED, Value::Bool(disabled)))?;
        Ok(true)
    }

    /// Replace the option list. Existing indices are not adjusted.
    pub fn update_options(&mut self, options: Value) -> Result<bool, ComponentError> {
        self.inner.ensure_alive()?;
        parse_options(&options)?;
        self.inner.batch(|s| {
            s.set(fields::OPTIONS, options)?;
            reconcile_selection(s)
        })?;
        Ok(true)
    }

    /// Filter by display text. Returns the match count; focus moves to the
    /// first match. An empty query clears the filter.
    pub fn search(&mut self, query: &str) -> Result<usize, ComponentError> {
        self.inner.ensure_alive()?;
        let options = self.options();
        if query.is_empty() {
            self.inner
                .batch(|s| s.set(fields::SEARCH_QUERY, Value::String(String::new())))?;
            return Ok(options.len());
        }

        let matches: Vec<usize> = options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.matches(query))
            .map(|(i, _)| i)
            .collect();
        let focus = matches.first().map_or(Value::Null, |i| json!(i));
        self.inner.batch(|s| {
            s.set(fields::SEARCH_QUERY, Value::String(query.to_string()))?;
            s.set(fields::FOCUSED_OPTION_INDEX, focus)
        })?;
        Ok(matches.len())
    }

    /// Apply props from `load_component` / `set_props`. Validates everything
    /// before writing anything.
    pub fn set_props(&mut self, props: &Map<String, Value>) -> Result<(), ComponentError> {
        self.inner.ensure_alive()?;
        let validated = validate_props(props)?;
        let replaces_options = validated.iter().any(|(k, _)| k == fields::OPTIONS);
        self.inner.batch(|s| {
            for (key, value) in validated {
                s.set(&key, value)?;
            }
            if replaces_options {
                reconcile_selection(s)?;
            }
            Ok(())
        })
    }

    /// Raw state patch. Computed fields are rejected by the state container.
    pub fn update_state(&mut self, patch: Map<String, Value>) -> Result<(), ComponentError> {
        if !patch.contains_key(fields::OPTIONS) {
            return self.inner.update_state(patch);
        }
        self.inner.batch(|s| {
            for (key, value) in patch {
                s.set(&key, value)?;
            }
            reconcile_selection(s)
        })
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    pub fn call(&mut self, method: SelectMethod) -> Result<Value, ComponentError> {
        let result = match method {
            SelectMethod::Open => json!(self.open()?),
            SelectMethod::Close => json!(self.close()?),
            SelectMethod::Toggle => json!(self.toggle()?),
            SelectMethod::FocusOption(i) => json!(self.focus_option(i)?),
            SelectMethod::FocusNextOption => json!(self.focus_next_option()?),
            SelectMethod::FocusPrevOption => json!(self.focus_prev_option()?),
            SelectMethod::SelectOption(i) => json!(self.select_option(i)?),
            SelectMethod::SelectByValue(v) => json!(self.select_by_value(&v)?),
            SelectMethod::SelectFocusedOption => json!(self.select_focused_option()?),
            SelectMethod::SetDisabled(d) => json!(self.set_disabled(d)?),
            SelectMethod::UpdateOptions(o) => json!(self.update_options(o)?),
            SelectMethod::Search(q) => json!(self.search(&q)?),
            SelectMethod::ClearSelection => json!(self.clear_selection()?),
            SelectMethod::GetSelected => self.get_selected()?,
        };
        Ok(result)
    }

    /// Snapshot with stale indices normalized to null.
    pub fn state_snapshot(&self) -> Result<Value, ComponentError> {
        self.inner.ensure_alive()?;
        let mut snap = self.reactive().snapshot();
        let focused = self.focused_index();
        let selected = self.selected_index();
        snap.insert(fields::FOCUSED_OPTION_INDEX.into(), json!(focused));
        snap.insert(fields::SELECTED_OPTION_INDEX.into(), json!(selected));
        if selected.is_none() {
            snap.insert(fields::SELECTED_VALUE.into(), Value::Null);
            snap.insert(fields::SELECTED_TEXT.into(), Value::Null);
        }
        Ok(Value::Object(snap))
    }
}

impl std::fmt::Debug for Select {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Select").field(&self.inner).finish()
    }
}

fn initial_state() -> ReactiveState {
    let mut values = Map::new();
    values.insert(fields::OPTIONS.into(), json!([]));
    values.insert(fields::IS_OPEN.into(), json!(false));
    values.insert(fields::DISABLED.into(), json!(false));
    values.insert(fields::MULTI.into(), json!(false));
    values.insert(fields::FOCUSED_OPTION_INDEX.into(), Value::Null);
    values.insert(fields::SELECTED_OPTION_INDEX.into(), Value::Null);
    values.insert(fields::SELECTED_VALUE.into(), Value::Null);
    values.insert(fields::SELECTED_TEXT.into(), Value::Null);
    values.insert(fields::SELECTED_OPTIONS.into(), json!([]));
    values.insert(fields::PLACEHOLDER.into(), json!(DEFAULT_PLACEHOLDER));
    values.insert(fields::TITLE.into(), json!(NAME));
    values.insert(fields::SEARCH_QUERY.into(), json!(""));

    let mut state = ReactiveState::with_values(values);
    state.computed(fields::OPTION_COUNT, |s| json!(options_of(s).len()));
    state.computed(fields::HAS_SELECTION, |s| {
        let has = if s.get_bool(fields::MULTI) {
            !selected_options_of(s).is_empty()
        } else {
            index_within(s, fields::SELECTED_OPTION_INDEX, options_of(s).len()).is_some()
        };
        json!(has)
    });
    state
}

fn watch_open_state(
    state: &mut ReactiveState,
    component_id: String,
    link: Arc<dyn ComponentLink>,
) -> crate::reactive::WatchDisposer {
    state.watch(fields::IS_OPEN, move |new, old| {
        if new == old {
            return Ok(());
        }
        let action = if new.as_bool().unwrap_or(false) {
            events::OPENED
        } else {
            events::CLOSED
        };
        link.emit(ComponentEvent::new(component_id.clone(), action, Value::Null));
        Ok(())
    })
}

/// Check known props and drop unknown ones.
fn validate_props(props: &Map<String, Value>) -> Result<Vec<(String, Value)>, ComponentError> {
    let mut out = Vec::with_capacity(props.len());
    for (key, value) in props {
        match key.as_str() {
            fields::OPTIONS => {
                parse_options(value)?;
            }
            fields::MULTI | fields::DISABLED | fields::IS_OPEN => {
                if !value.is_boolean() {
                    return Err(ComponentError::validation(format!(
                        "{key} must be a boolean"
                    )));
                }
            }
            fields::PLACEHOLDER | fields::TITLE => {
                if !value.is_string() {
                    return Err(ComponentError::validation(format!("{key} must be a string")));
                }
            }
            _ => {
                tracing::debug!(prop = %key, "Ignoring unknown Select prop");
                continue;
            }
        }
        out.push((key.clone(), value.clone()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{BufferHandle, MockBufferBackend, MockComponentLink};
    use std::sync::Mutex;

    fn three_options() -> Value {
        json!([
            {"id": "1", "text": "Option 1", "value": "option1"},
            {"id": "2", "text": "Option 2", "value": "option2"},
            {"id": "3", "text": "Option 3", "value": "option3"},
        ])
    }

    fn props(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    fn backend() -> MockBufferBackend {
        let mut backend = MockBufferBackend::new();
        backend
            .expect_create()
            .returning(|_, _| Ok(BufferHandle::new(1)));
        backend.expect_set_lines().returning(|_, _| Ok(()));
        backend.expect_close().returning(|_| Ok(()));
        backend
    }

    /// Link that records emitted event names
    fn recording_link(log: Arc<Mutex<Vec<String>>>) -> MockComponentLink {
        let mut link = MockComponentLink::new();
        link.expect_emit()
            .returning(move |e| log.lock().unwrap().push(e.action));
        link.expect_detach().returning(|_| ());
        link
    }

    fn select(p: Value) -> (Select, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let deps = ComponentDeps::new(Arc::new(backend()), Arc::new(recording_link(log.clone())));
        let mut s = Select::new("select-test", &props(p), deps).unwrap();
        s.mount().unwrap();
        (s, log)
    }

    #[test]
    fn single_select_sets_value_and_closes() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        assert!(s.open().unwrap());
        assert!(s.select_option(1).unwrap());

        let state = s.state_snapshot().unwrap();
        assert_eq!(state["is_open"], json!(false));
        assert_eq!(state["selected_option_index"], json!(1));
        assert_eq!(state["selected_value"], json!("option2"));
        assert_eq!(state["selected_text"], json!("Option 2"));
        assert_eq!(state["has_selection"], json!(true));
    }

    #[test]
    fn multi_select_twice_restores_selection() {
        let (mut s, log) = select(json!({ "options": three_options(), "multi": true }));
        s.open().unwrap();

        assert!(s.select_option(0).unwrap());
        assert!(s.select_option(2).unwrap());
        assert_eq!(s.get_selected().unwrap().as_array().unwrap().len(), 2);
        assert!(s.is_open());

        assert!(s.select_option(2).unwrap());
        let selected = s.get_selected().unwrap();
        assert_eq!(selected.as_array().unwrap().len(), 1);
        assert_eq!(selected[0]["value"], json!("option1"));

        let seen = log.lock().unwrap().clone();
        assert_eq!(
            seen.iter().filter(|e| *e == events::OPTION_DESELECTED).count(),
            1
        );
    }

    #[test]
    fn focus_next_clamps_at_the_last_option() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        for _ in 0..(3 + 5) {
            s.focus_next_option().unwrap();
        }
        assert_eq!(s.focused_index(), Some(2));
    }

    #[test]
    fn focus_prev_from_nothing_lands_on_last_then_clamps_at_zero() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        s.focus_prev_option().unwrap();
        assert_eq!(s.focused_index(), Some(2));
        for _ in 0..10 {
            s.focus_prev_option().unwrap();
        }
        assert_eq!(s.focused_index(), Some(0));
    }

    #[test]
    fn navigation_on_empty_list_is_a_noop() {
        let (mut s, _) = select(json!({}));
        assert!(!s.focus_next_option().unwrap());
        assert!(!s.focus_prev_option().unwrap());
        assert_eq!(s.focused_index(), None);
        assert!(!s.select_by_value(&json!("anything")).unwrap());
    }

    #[test]
    fn disabled_select_declines_to_open() {
        let (mut s, log) = select(json!({ "options": three_options(), "disabled": true }));
        assert!(!s.open().unwrap());
        assert!(!s.is_open());
        assert!(!log.lock().unwrap().iter().any(|e| e == events::OPENED));
    }

    #[test]
    fn disabling_does_not_close() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        s.open().unwrap();
        s.set_disabled(true).unwrap();
        assert!(s.is_open());
    }

    #[test]
    fn focus_out_of_range_is_declined() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        assert!(!s.focus_option(3).unwrap());
        assert!(!s.focus_option(-1).unwrap());
        assert!(s.focus_option(1).unwrap());
        assert_eq!(s.focused_index(), Some(1));
    }

    #[test]
    fn select_focused_requires_focus() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        assert!(!s.select_focused_option().unwrap());
        s.focus_option(2).unwrap();
        assert!(s.select_focused_option().unwrap());
        assert_eq!(s.selected_index(), Some(2));
    }

    #[test]
    fn select_by_value_uses_first_match() {
        let (mut s, _) = select(json!({
            "options": [
                {"id": "a", "text": "A", "value": 1},
                {"id": "b", "text": "B", "value": 1},
            ]
        }));
        assert!(s.select_by_value(&json!(1)).unwrap());
        assert_eq!(s.selected_index(), Some(0));
    }

    #[test]
    fn replacing_options_leaves_stale_indices_null() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        s.focus_option(2).unwrap();
        s.select_option(2).unwrap();

        s.update_options(json!([{"id": "x", "text": "Only", "value": 0}]))
            .unwrap();
        let state = s.state_snapshot().unwrap();
        assert_eq!(state["focused_option_index"], Value::Null);
        assert_eq!(state["selected_option_index"], Value::Null);
        assert_eq!(state["selected_value"], Value::Null);
        assert_eq!(state["selected_text"], Value::Null);
        assert_eq!(state["has_selection"], json!(false));
        assert_eq!(state["option_count"], json!(1));
        assert_eq!(s.get_selected().unwrap(), Value::Null);
    }

    #[test]
    fn replacing_options_refreshes_a_selection_still_in_range() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        s.select_option(0).unwrap();

        s.update_options(json!([
            {"id": "k", "text": "Kiwi", "value": "kiwi"},
            {"id": "l", "text": "Lime", "value": "lime"},
        ]))
        .unwrap();
        let state = s.state_snapshot().unwrap();
        assert_eq!(state["selected_option_index"], json!(0));
        assert_eq!(state["selected_value"], json!("kiwi"));
        assert_eq!(state["selected_text"], json!("Kiwi"));
    }

    #[test]
    fn replacing_options_drops_missing_multi_entries() {
        let (mut s, _) = select(json!({ "options": three_options(), "multi": true }));
        s.select_option(0).unwrap();
        s.select_option(2).unwrap();

        s.set_props(&props(json!({
            "options": [{"id": "1", "text": "Option 1", "value": "option1"}],
        })))
        .unwrap();
        let selected = s.get_selected().unwrap();
        assert_eq!(selected.as_array().unwrap().len(), 1);
        assert_eq!(selected[0]["value"], json!("option1"));
    }

    fn berries() -> Value {
        json!({
            "options": [
                {"id": "1", "text": "Apple", "value": "a"},
                {"id": "2", "text": "Banana", "value": "b"},
                {"id": "3", "text": "Blueberry", "value": "c"},
                {"id": "4", "text": "Cherry", "value": "d"},
            ]
        })
    }

    #[test]
    fn focus_navigation_skips_filtered_options() {
        let (mut s, _) = select(berries());
        s.open().unwrap();
        assert_eq!(s.search("b").unwrap(), 2);
        assert_eq!(s.focused_index(), Some(1));

        assert!(s.focus_prev_option().unwrap());
        assert_eq!(s.focused_index(), Some(1));

        assert!(s.focus_next_option().unwrap());
        assert_eq!(s.focused_index(), Some(2));
        assert!(s.focus_next_option().unwrap());
        assert_eq!(s.focused_index(), Some(2));

        assert!(s.select_focused_option().unwrap());
        assert_eq!(s.state_snapshot().unwrap()["selected_text"], json!("Blueberry"));
    }

    #[test]
    fn hidden_focus_is_not_selectable() {
        let (mut s, _) = select(berries());
        s.open().unwrap();
        s.focus_option(0).unwrap();
        s.search("b").unwrap();
        s.focus_option(3).unwrap();

        assert!(!s.select_focused_option().unwrap());
        assert_eq!(s.selected_index(), None);

        let lines = render(s.instance().state());
        assert!(!lines.iter().any(|l| l.contains("Apple") || l.contains("Cherry")));

        // From a hidden focus, prev lands on the nearest visible option before it
        assert!(s.focus_prev_option().unwrap());
        assert_eq!(s.focused_index(), Some(2));
    }

    #[test]
    fn navigation_with_no_matches_is_declined() {
        let (mut s, _) = select(berries());
        s.search("kiwi").unwrap();
        assert!(!s.focus_next_option().unwrap());
        assert!(!s.select_focused_option().unwrap());
    }

    #[test]
    fn non_array_options_leave_state_unchanged() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        let err = s.update_options(json!("nope")).unwrap_err();
        assert!(matches!(err, ComponentError::Validation(_)));
        assert_eq!(s.state_snapshot().unwrap()["options"], three_options());
    }

    #[test]
    fn open_close_emit_events_once_per_change() {
        let (mut s, log) = select(json!({ "options": three_options() }));
        s.open().unwrap();
        s.open().unwrap();
        s.close().unwrap();
        s.close().unwrap();

        let seen: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with("select:"))
            .cloned()
            .collect();
        assert_eq!(seen, vec![events::OPENED, events::CLOSED]);
    }

    #[test]
    fn search_filters_and_focuses_first_match() {
        let (mut s, _) = select(json!({
            "options": [
                {"id": "1", "text": "Apple", "value": "a"},
                {"id": "2", "text": "Banana", "value": "b"},
                {"id": "3", "text": "Blueberry", "value": "c"},
            ]
        }));
        assert_eq!(s.search("b").unwrap(), 2);
        assert_eq!(s.focused_index(), Some(1));
        assert_eq!(s.search("BL").unwrap(), 1);
        assert_eq!(s.focused_index(), Some(2));
        assert_eq!(s.search("kiwi").unwrap(), 0);
        assert_eq!(s.focused_index(), None);
        assert_eq!(s.search("").unwrap(), 3);
    }

    #[test]
    fn set_props_validates_before_writing() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        let err = s
            .set_props(&props(json!({ "title": "Fruit", "multi": "yes" })))
            .unwrap_err();
        assert!(matches!(err, ComponentError::Validation(_)));
        assert_eq!(s.state_snapshot().unwrap()["title"], json!("Select"));

        s.set_props(&props(json!({ "title": "Fruit", "color": "red" })))
            .unwrap();
        let state = s.state_snapshot().unwrap();
        assert_eq!(state["title"], json!("Fruit"));
        assert!(state.get("color").is_none());
    }

    #[test]
    fn destroyed_select_rejects_operations() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        assert!(s.destroy());
        assert!(!s.destroy());
        assert!(s.open().unwrap_err().is_destroyed());
        assert!(s.call(SelectMethod::Close).unwrap_err().is_destroyed());
        assert!(s.state_snapshot().unwrap_err().is_destroyed());
    }

    #[test]
    fn clear_selection_resets_both_modes() {
        let (mut s, _) = select(json!({ "options": three_options() }));
        s.select_option(0).unwrap();
        s.clear_selection().unwrap();
        assert_eq!(s.get_selected().unwrap(), Value::Null);
        assert_eq!(s.state_snapshot().unwrap()["has_selection"], json!(false));
    }
}
