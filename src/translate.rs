//! Turns tool invocations into the short labels shown on the overlay.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Number of characters of the parameter dump kept for unknown tools.
pub const FALLBACK_PARAMS_LIMIT: usize = 50;
/// Unknown tool names are cut to this many characters.
pub const FALLBACK_NAME_LIMIT: usize = 32;
/// Upper bound, in characters, of any fallback description.
pub const FALLBACK_MAX_CHARS: usize = FALLBACK_NAME_LIMIT + FALLBACK_PARAMS_LIMIT + ": ...".len();

const KEY_LABELS: &[(&str, &str)] = &[
    ("Return", "enter ⏎"),
    ("return", "enter ⏎"),
    ("enter", "enter ⏎"),
    ("Tab", "tab ⇥"),
    ("tab", "tab ⇥"),
    ("Escape", "esc"),
    ("esc", "esc"),
    ("Space", "space"),
    ("space", "space"),
];

/// One pending tool call as reported by the dispatch loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Value,
}

impl ActionDescriptor {
    pub fn new(tool_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
        }
    }

    pub fn describe(&self) -> String {
        translate(&self.tool_name, &self.parameters)
    }

    pub fn param(&self, key: &str) -> Cow<'_, str> {
        param_str(&self.parameters, key)
    }
}

/// Translate a single tool invocation. Never fails and never returns an
/// empty string.
pub fn translate(tool_name: &str, parameters: &Value) -> String {
    let described = match tool_name {
        "bash" => format!("$ {}", param_str(parameters, "command")),
        "computer" => describe_computer(parameters),
        "str_replace_editor" => describe_editor(parameters),
        _ => return fallback_description(tool_name, parameters),
    };

    if described.trim().is_empty() {
        fallback_description(tool_name, parameters)
    } else {
        described
    }
}

/// Translate every action independently and join them one per line.
pub fn translate_batch(actions: &[ActionDescriptor]) -> String {
    actions
        .iter()
        .map(ActionDescriptor::describe)
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_computer(parameters: &Value) -> String {
    let action = param_str(parameters, "action");
    let text = param_str(parameters, "text");

    match action.as_ref() {
        "mouse_move" => match coordinate(parameters) {
            Some((x, y)) => format!("mouse_move ({x}, {y})"),
            None => "mouse_move".to_string(),
        },
        "left_click" => "click".to_string(),
        "right_click" => "right click".to_string(),
        "double_click" => "double click".to_string(),
        "type" => format!("type \"{text}\""),
        "key" => key_label(&text),
        "screenshot" => "📸 screenshot".to_string(),
        other if text.is_empty() => other.to_string(),
        other => format!("{other} {text}"),
    }
}

fn describe_editor(parameters: &Value) -> String {
    let command = param_str(parameters, "command");
    let path = param_str(parameters, "path");

    match command.as_ref() {
        "view" => format!("📖 view {path}"),
        "create" => format!("📝 create {path}"),
        "str_replace" => format!("✏️ edit {path}"),
        "insert" => format!("➕ insert in {path}"),
        "undo_edit" => format!("↩️ undo {path}"),
        other => format!("edit: {other} {path}"),
    }
}

/// Map a key name to its display label. Function keys (`f1`, `f12`, ...)
/// keep their original spelling; anything unmapped is lower-cased.
pub fn key_label(key: &str) -> String {
    if let Some((_, label)) = KEY_LABELS.iter().find(|(name, _)| *name == key) {
        return (*label).to_string();
    }
    if key.starts_with('f') {
        key.to_string()
    } else {
        key.to_lowercase()
    }
}

fn coordinate(parameters: &Value) -> Option<(String, String)> {
    let items = parameters.get("coordinate")?.as_array()?;
    match items.as_slice() {
        [x, y, ..] => Some((scalar_text(x).into_owned(), scalar_text(y).into_owned())),
        _ => None,
    }
}

/// Read a parameter as text. Missing or `null` values become the empty
/// string; numbers and booleans keep their JSON spelling.
pub fn param_str<'a>(parameters: &'a Value, key: &str) -> Cow<'a, str> {
    parameters
        .get(key)
        .map(scalar_text)
        .unwrap_or(Cow::Borrowed(""))
}

fn scalar_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

fn fallback_description(tool_name: &str, parameters: &Value) -> String {
    let name = truncate_chars(tool_name, FALLBACK_NAME_LIMIT);
    let name = if name.trim().is_empty() { "tool" } else { name };
    let dump = match parameters {
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    };
    format!("{name}: {}...", truncate_chars(&dump, FALLBACK_PARAMS_LIMIT))
}

fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bash_commands_get_a_prompt_prefix() {
        assert_eq!(translate("bash", &json!({ "command": "ls" })), "$ ls");
        assert_eq!(translate("bash", &json!({})), "$ ");
    }

    #[test]
    fn mouse_move_includes_coordinates_when_present() {
        assert_eq!(
            translate(
                "computer",
                &json!({ "action": "mouse_move", "coordinate": [120, 48] })
            ),
            "mouse_move (120, 48)"
        );
        assert_eq!(
            translate("computer", &json!({ "action": "mouse_move" })),
            "mouse_move"
        );
        assert_eq!(
            translate(
                "computer",
                &json!({ "action": "mouse_move", "coordinate": [3] })
            ),
            "mouse_move"
        );
    }

    #[test]
    fn click_variants_use_fixed_labels() {
        for (action, label) in [
            ("left_click", "click"),
            ("right_click", "right click"),
            ("double_click", "double click"),
        ] {
            assert_eq!(translate("computer", &json!({ "action": action })), label);
        }
    }

    #[test]
    fn key_table_and_passthrough_rules() {
        assert_eq!(key_label("Return"), "enter ⏎");
        assert_eq!(key_label("return"), key_label("enter"));
        assert_eq!(key_label("Tab"), "tab ⇥");
        assert_eq!(key_label("Escape"), "esc");
        assert_eq!(key_label("Space"), "space");
        assert_eq!(key_label("f5"), "f5");
        assert_eq!(key_label("F5"), "f5");
        assert_eq!(key_label("Ctrl+C"), "ctrl+c");
    }

    #[test]
    fn uncommon_computer_actions_echo_action_and_text() {
        assert_eq!(
            translate("computer", &json!({ "action": "middle_click" })),
            "middle_click"
        );
        assert_eq!(
            translate(
                "computer",
                &json!({ "action": "cursor_position", "text": "now" })
            ),
            "cursor_position now"
        );
    }

    #[test]
    fn editor_commands_name_the_target_path() {
        let cases = [
            ("view", "📖 view /a"),
            ("create", "📝 create /a"),
            ("str_replace", "✏️ edit /a"),
            ("insert", "➕ insert in /a"),
            ("undo_edit", "↩️ undo /a"),
            ("rename", "edit: rename /a"),
        ];
        for (command, expected) in cases {
            assert_eq!(
                translate(
                    "str_replace_editor",
                    &json!({ "command": command, "path": "/a" })
                ),
                expected
            );
        }
    }

    #[test]
    fn blank_recognised_output_falls_back() {
        let out = translate("computer", &json!({}));
        assert!(out.starts_with("computer: "));
        let out = translate("computer", &json!({ "action": "key" }));
        assert!(!out.trim().is_empty());
    }

    #[test]
    fn fallback_is_bounded_for_long_names_and_dumps() {
        let name = "x".repeat(500);
        let params = json!({ "blob": "é".repeat(400) });
        let out = translate(&name, &params);
        assert!(out.chars().count() <= FALLBACK_MAX_CHARS);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn non_string_parameters_render_as_json_text() {
        assert_eq!(
            translate("computer", &json!({ "action": "type", "text": 42 })),
            "type \"42\""
        );
    }
}
