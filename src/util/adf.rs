use serde_json::Value;

pub const NO_DESCRIPTION: &str = "*No description provided.*";

/// Render a Jira description field as text.
///
/// An Atlassian Document Format (ADF) document is read two levels deep: each
/// top-level block's spans are joined with spaces and blocks are joined with
/// newlines. Plain strings pass through. Anything else, or an empty result,
/// becomes [`NO_DESCRIPTION`].
pub fn description_text(value: Option<&Value>) -> String {
    let text = match value {
        Some(Value::Object(doc)) => doc
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .map(block_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };

    match text {
        Some(t) if !t.is_empty() => t,
        _ => NO_DESCRIPTION.to_string(),
    }
}

fn block_text(block: &Value) -> String {
    let Some(spans) = block.get("content").and_then(Value::as_array) else {
        return String::new();
    };
    spans
        .iter()
        .map(|span| span.get("text").and_then(Value::as_str).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}
