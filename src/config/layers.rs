//! Attribute layering.
//!
//! A record's attributes are built from ordered layers: kind defaults, the
//! template chain (root first), project defaults and finally the part's own
//! attributes. Each layer is deep-merged onto the result of the previous
//! ones. A string mentioning `${super}` is expanded with the value the key
//! had before the layer, and a `${super}` array element splices the previous
//! array in place.

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::resource::{Record, ResourceKind, marker, tracking_id};

use super::registry::TemplateRegistry;
use super::spec::{PartSpec, ProjectSpec};

/// Placeholder for the value of the previous layer.
pub const SUPER: &str = "${super}";

/// Deep-merges `layer` onto `base`.
pub fn merge_layer(base: &mut Map<String, Value>, layer: &Map<String, Value>) {
    for (key, value) in layer {
        let merged = match (base.get_mut(key), value) {
            (Some(Value::Object(prior)), Value::Object(next)) => {
                merge_layer(prior, next);
                continue;
            }
            (prior, value) => expand_super(value, prior.as_deref()),
        };
        base.insert(key.clone(), merged);
    }
}

fn expand_super(value: &Value, prior: Option<&Value>) -> Value {
    match value {
        Value::String(s) if s.contains(SUPER) => {
            let replacement = match prior {
                Some(Value::String(p)) => p.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Value::String(s.replace(SUPER, &replacement))
        }
        Value::Array(items) if items.iter().any(|i| i.as_str() == Some(SUPER)) => {
            let mut expanded = Vec::with_capacity(items.len());
            for item in items {
                match (item.as_str(), prior) {
                    (Some(SUPER), Some(Value::Array(previous))) => {
                        expanded.extend(previous.iter().cloned());
                    }
                    (Some(SUPER), _) => {}
                    _ => expanded.push(item.clone()),
                }
            }
            Value::Array(expanded)
        }
        other => other.clone(),
    }
}

/// Builds records from project and part definitions.
#[derive(Debug)]
pub struct RecordBuilder<'a> {
    registry: &'a TemplateRegistry,
}

impl<'a> RecordBuilder<'a> {
    /// Creates a builder resolving templates from `registry`.
    #[must_use]
    pub const fn new(registry: &'a TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Resolves one part into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is unknown, loops or is of another
    /// kind than the part.
    pub fn build(&self, project: &ProjectSpec, part: &PartSpec) -> Result<Record> {
        let kind = part.kind;
        let mut attributes = kind.base_attributes();

        if let Some(name) = &part.template {
            for template in self.registry.chain(name)? {
                if template.kind != kind {
                    return Err(ConfigError::invalid(
                        format!(
                            "{}:{} is a {kind} but template {name} builds a {}",
                            project.kennel_id, part.kennel_id, template.kind
                        ),
                        "template",
                    )
                    .into());
                }
                merge_layer(&mut attributes, &template.attributes);
            }
        }
        if let Some(defaults) = project.defaults.get(&kind) {
            merge_layer(&mut attributes, defaults);
        }
        merge_layer(&mut attributes, &part.attributes);

        if let Some(id) = &part.id {
            attributes.insert(String::from("id"), id.clone());
        }
        if kind != ResourceKind::Dashboard {
            add_tags(&mut attributes, project);
        }

        if kind == ResourceKind::Monitor
            && let Some(mention) = &project.mention
        {
            append_text(&mut attributes, "message", mention);
        }
        let tracking_id = tracking_id(&project.kennel_id, &part.kennel_id);
        append_text(&mut attributes, kind.text_field(), &marker(&tracking_id));

        Ok(Record::new(kind, &project.kennel_id, &part.kennel_id, attributes))
    }
}

fn add_tags(attributes: &mut Map<String, Value>, project: &ProjectSpec) {
    let mut tags: Vec<Value> = match attributes.get("tags") {
        Some(Value::Array(tags)) => tags.clone(),
        _ => Vec::new(),
    };
    let team = project.team.as_ref().map(|team| format!("team:{team}"));
    for tag in project.tags.iter().chain(team.as_ref()) {
        let tag = Value::from(tag.as_str());
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    attributes.insert(String::from("tags"), Value::Array(tags));
}

/// Appends a paragraph to a text attribute unless it is already present.
fn append_text(attributes: &mut Map<String, Value>, field: &str, paragraph: &str) {
    let text = attributes
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim_end();
    if text.contains(paragraph) {
        return;
    }
    let text = if text.is_empty() {
        paragraph.to_string()
    } else {
        format!("{text}\n\n{paragraph}")
    };
    attributes.insert(field.to_string(), Value::String(text));
}
