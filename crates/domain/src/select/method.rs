//! Select method table
//!
//! Method names are plain strings only at the edge; everything past `parse`
//! works with `SelectMethod`.

use serde_json::Value;

use crate::error::ComponentError;

#[derive(Debug, Clone, PartialEq)]
pub enum SelectMethod {
    Open,
    Close,
    Toggle,
    /// Signed so that a negative index is a declined action rather than a type error
    FocusOption(i64),
    FocusNextOption,
    FocusPrevOption,
    SelectOption(i64),
    SelectByValue(Value),
    SelectFocusedOption,
    SetDisabled(bool),
    UpdateOptions(Value),
    Search(String),
    ClearSelection,
    GetSelected,
}

impl SelectMethod {
    pub const NAMES: &'static [&'static str] = &[
        "open",
        "close",
        "toggle",
        "focus_option",
        "focus_next_option",
        "focus_prev_option",
        "select_option",
        "select_by_value",
        "select_focused_option",
        "set_disabled",
        "update_options",
        "search",
        "clear_selection",
        "get_selected",
    ];

    pub fn parse(name: &str, args: &[Value]) -> Result<Self, ComponentError> {
        let method = match name {
            "open" => Self::Open,
            "close" => Self::Close,
            "toggle" => Self::Toggle,
            "focus_option" => Self::FocusOption(index_arg(name, args)?),
            "focus_next_option" => Self::FocusNextOption,
            "focus_prev_option" => Self::FocusPrevOption,
            "select_option" => Self::SelectOption(index_arg(name, args)?),
            "select_by_value" => Self::SelectByValue(args.first().cloned().unwrap_or(Value::Null)),
            "select_focused_option" => Self::SelectFocusedOption,
            "set_disabled" => Self::SetDisabled(bool_arg(name, args)?),
            "update_options" => Self::UpdateOptions(required_arg(name, args)?.clone()),
            "search" => Self::Search(string_arg(name, args)?),
            "clear_selection" => Self::ClearSelection,
            "get_selected" => Self::GetSelected,
            _ => return Err(ComponentError::method_not_found("Select", name)),
        };
        Ok(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Toggle => "toggle",
            Self::FocusOption(_) => "focus_option",
            Self::FocusNextOption => "focus_next_option",
            Self::FocusPrevOption => "focus_prev_option",
            Self::SelectOption(_) => "select_option",
            Self::SelectByValue(_) => "select_by_value",
            Self::SelectFocusedOption => "select_focused_option",
            Self::SetDisabled(_) => "set_disabled",
            Self::UpdateOptions(_) => "update_options",
            Self::Search(_) => "search",
            Self::ClearSelection => "clear_selection",
            Self::GetSelected => "get_selected",
        }
    }
}

fn required_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a Value, ComponentError> {
    args.first()
        .ok_or_else(|| ComponentError::validation(format!("{method} expects one argument")))
}

fn index_arg(method: &str, args: &[Value]) -> Result<i64, ComponentError> {
    required_arg(method, args)?.as_i64().ok_or_else(|| {
        ComponentError::validation(format!("{method} expects an integer index"))
    })
}

fn bool_arg(method: &str, args: &[Value]) -> Result<bool, ComponentError> {
    required_arg(method, args)?
        .as_bool()
        .ok_or_else(|| ComponentError::validation(format!("{method} expects a boolean")))
}

fn string_arg(method: &str, args: &[Value]) -> Result<String, ComponentError> {
    match args.first() {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ComponentError::validation(format!(
            "{method} expects a string"
        ))),
    }
}
