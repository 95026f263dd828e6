use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

/// Replaces every `{{key}}` occurrence for each key in `variables`.
/// Placeholders without a matching variable are left as they are.
pub fn render(template: &str, variables: &HashMap<String, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

/// Renders a structured template through its serialized form. Values are
/// substituted unescaped, so a value containing JSON syntax can break parsing.
pub fn render_json(
    template: &JsonValue,
    variables: &HashMap<String, String>,
) -> Result<JsonValue, serde_json::Error> {
    let serialized = serde_json::to_string(template)?;
    serde_json::from_str(&render(&serialized, variables))
}

/// Merges template-derived data over explicit request data. Keys present in
/// both take the template's value.
pub fn merge_data(
    explicit: Map<String, JsonValue>,
    from_template: Map<String, JsonValue>,
) -> Map<String, JsonValue> {
    let mut merged = explicit;
    merged.extend(from_template);
    merged
}
