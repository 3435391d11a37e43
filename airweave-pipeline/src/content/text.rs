//! Concatenates embeddable fields into one textual representation per
//! entity, per declared field metadata.

use airweave_source::{BaseEntity, FieldSpec};

/// Joins every field `spec` marks embeddable, in the order given, preceded
/// by the entity's name. Empty result means: drop this entity from the
/// batch and count it `skipped`.
pub fn build_textual_representation(entity: &BaseEntity, specs: &[FieldSpec]) -> String {
    let mut parts = Vec::new();
    if !entity.name.is_empty() {
        parts.push(entity.name.clone());
    }
    for spec in specs {
        if !spec.embeddable {
            continue;
        }
        if let Some(value) = entity.fields.get(spec.name) {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }
    }
    parts.join("\n\n")
}
