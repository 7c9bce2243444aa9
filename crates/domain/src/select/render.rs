//! Text projection of Select state. No side effects.

use crate::reactive::ReactiveState;

use super::{fields, index_within, options_of, selected_options_of, visible_indices};

pub const DEFAULT_PLACEHOLDER: &str = "Select an option...";

pub fn render(state: &ReactiveState) -> Vec<String> {
    let options = options_of(state);
    let multi = state.get_bool(fields::MULTI);
    let is_open = state.get_bool(fields::IS_OPEN);
    let focused = index_within(state, fields::FOCUSED_OPTION_INDEX, options.len());
    let selected = index_within(state, fields::SELECTED_OPTION_INDEX, options.len());
    let chosen = selected_options_of(state);

    let mut lines = Vec::with_capacity(options.len() + 3);

    let title = state
        .get_str(fields::TITLE)
        .unwrap_or_else(|| "Select".to_string());
    let arrow = if is_open { "v" } else { ">" };
    if state.get_bool(fields::DISABLED) {
        lines.push(format!("{arrow} {title} (disabled)"));
    } else {
        lines.push(format!("{arrow} {title}"));
    }

    let summary = if multi {
        (!chosen.is_empty()).then(|| {
            chosen
                .iter()
                .map(|o| o.text.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
    } else {
        selected.map(|i| options[i].text.clone())
    };
    match summary {
        Some(text) => lines.push(format!("  Selected: {text}")),
        None => lines.push(format!(
            "  {}",
            state
                .get_str(fields::PLACEHOLDER)
                .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string())
        )),
    }

    if !is_open {
        return lines;
    }

    let query = state.get_str(fields::SEARCH_QUERY).unwrap_or_default();
    if !query.is_empty() {
        lines.push(format!("  Search: {query}"));
    }

    let visible = visible_indices(state, &options);
    for &index in &visible {
        let option = &options[index];
        let cursor = if focused == Some(index) { ">" } else { " " };
        let mark = if multi {
            if chosen.iter().any(|c| c.same_entry(option)) {
                "[x]"
            } else {
                "[ ]"
            }
        } else if selected == Some(index) {
            "(*)"
        } else {
            "( )"
        };
        lines.push(format!("{cursor} {mark} {}", option.text));
    }

    if visible.is_empty() {
        lines.push("  (no options)".to_string());
    }

    lines
}
