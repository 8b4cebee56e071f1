use serde_json::Value;
use scholar_core::TurnEvent;

/// Console text for one turn event, or `None` for events that only go to
/// the log.
pub fn render_event(label: &str, event: &TurnEvent) -> Option<String> {
    match event {
        TurnEvent::Text { text, .. } => Some(format!("\n🦉 {label} > {text}")),
        TurnEvent::ToolResult {
            tool_name, output, ..
        } if !output.is_null() => Some(format!(
            "🛠️ Tool `{tool_name}` output:\n{}",
            render_output(output)
        )),
        TurnEvent::Error { message, .. } => Some(format!(
            "\n⚠️ {label} could not complete this turn: {message}"
        )),
        _ => None,
    }
}

/// Strings pass through; everything else is pretty-printed JSON.
pub fn render_output(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
