//! Tool input schema generation.
//!
//! Schemas are derived from a tool's input type through `schemars`, so the
//! description the model sees can never drift from what the handler decodes.
//! Generated schemas:
//! - forbid unknown properties on every object
//! - inline nested types (no `$ref` / `definitions`)
//! - are absent entirely when the input type has no fields

use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use schemars::schema::{InstanceType, RootSchema, Schema, SchemaObject};
use schemars::visit::{Visitor, visit_schema_object};

/// Generate the argument schema for `T`, or `None` if `T` takes no arguments.
pub fn input_schema<T: JsonSchema>() -> Option<RootSchema> {
    let settings = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.meta_schema = None;
        })
        .with_visitor(DenyAdditionalProperties);

    let mut root = settings.into_generator().into_root_schema_for::<T>();

    if takes_no_arguments(&root.schema) {
        return None;
    }

    if let Some(metadata) = root.schema.metadata.as_mut() {
        metadata.title = None;
    }
    Some(root)
}

fn takes_no_arguments(schema: &SchemaObject) -> bool {
    if schema.has_type(InstanceType::Null) {
        return true;
    }
    schema.has_type(InstanceType::Object)
        && schema
            .object
            .as_ref()
            .is_none_or(|object| object.properties.is_empty())
}

/// Sets `additionalProperties: false` on every object that doesn't already
/// say something about additional properties (maps keep their value schema).
#[derive(Debug, Clone)]
struct DenyAdditionalProperties;

impl Visitor for DenyAdditionalProperties {
    fn visit_schema_object(&mut self, schema: &mut SchemaObject) {
        if schema.has_type(InstanceType::Object) {
            let object = schema.object();
            if object.additional_properties.is_none() {
                object.additional_properties = Some(Box::new(Schema::Bool(false)));
            }
        }
        visit_schema_object(self, schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct ReadInput {
        /// The relative path of a file.
        path: String,
        #[serde(default)]
        lines: Option<u32>,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Outer {
        name: String,
        inner: Inner,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Inner {
        depth: u32,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Empty {}

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct WithMap {
        headers: HashMap<String, String>,
    }

    fn to_value(root: RootSchema) -> serde_json::Value {
        serde_json::to_value(root).unwrap()
    }

    #[test]
    fn object_schema_has_properties_and_required() {
        let schema = to_value(input_schema::<ReadInput>().unwrap());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["path"]["type"], "string");
        assert_eq!(schema["required"], serde_json::json!(["path"]));
    }

    #[test]
    fn field_docs_become_descriptions() {
        let schema = to_value(input_schema::<ReadInput>().unwrap());
        assert_eq!(
            schema["properties"]["path"]["description"],
            "The relative path of a file."
        );
    }

    #[test]
    fn unknown_properties_disallowed() {
        let schema = to_value(input_schema::<ReadInput>().unwrap());
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn nested_types_are_inlined() {
        let schema = to_value(input_schema::<Outer>().unwrap());
        let text = schema.to_string();
        assert!(!text.contains("$ref"), "schema has references: {text}");
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["properties"]["inner"]["additionalProperties"], false);
        assert!(schema["properties"]["inner"]["properties"]["depth"].is_object());
    }

    #[test]
    fn no_meta_schema_or_title() {
        let schema = to_value(input_schema::<ReadInput>().unwrap());
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("title").is_none());
    }

    #[test]
    fn empty_input_has_no_schema() {
        assert!(input_schema::<Empty>().is_none());
        assert!(input_schema::<()>().is_none());
    }

    #[test]
    fn map_values_keep_their_schema() {
        let schema = to_value(input_schema::<WithMap>().unwrap());
        assert_eq!(
            schema["properties"]["headers"]["additionalProperties"]["type"],
            "string"
        );
    }
}
