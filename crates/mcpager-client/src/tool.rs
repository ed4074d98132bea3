//! RemoteTool wraps one server tool as an `mcpager_types::Tool`.

use crate::backend::call_remote;
use mcpager_session::Session;
use mcpager_types::{Tool, ToolCallOutput, ToolDescriptor, ToolError};
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Argument kinds understood by the schema table. Anything else is a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
}

impl ArgKind {
    /// Map a JSON-schema `type` to a kind.
    pub fn from_schema_type(ty: Option<&str>) -> Self {
        match ty {
            Some("number") => ArgKind::Number,
            Some("integer") => ArgKind::Integer,
            Some("boolean") => ArgKind::Boolean,
            Some("array") => ArgKind::Array,
            _ => ArgKind::String,
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ArgKind::String => value.is_string(),
            ArgKind::Number => value.is_number(),
            ArgKind::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            ArgKind::Boolean => value.is_boolean(),
            ArgKind::Array => value.is_array(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ArgKind::String => "string",
            ArgKind::Number => "number",
            ArgKind::Integer => "integer",
            ArgKind::Boolean => "boolean",
            ArgKind::Array => "array",
        }
    }
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: String,
    pub kind: ArgKind,
    pub required: bool,
}

/// Argument model built once from a tool's `inputSchema`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgsSchema {
    fields: Vec<ArgSpec>,
}

impl ArgsSchema {
    /// Build from an `inputSchema`; a missing schema declares no arguments.
    pub fn from_input_schema(schema: Option<&Value>) -> Self {
        let Some(schema) = schema else {
            return Self::default();
        };

        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let fields = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| ArgSpec {
                        name: name.clone(),
                        kind: ArgKind::from_schema_type(
                            property.get("type").and_then(Value::as_str),
                        ),
                        required: required.contains(&name.as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { fields }
    }

    pub fn fields(&self) -> &[ArgSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ArgSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check `arguments` against the declared fields.
    ///
    /// Undeclared arguments are passed through unchecked; `null` counts as
    /// absent.
    pub fn validate(&self, tool: &str, arguments: &Value) -> Result<(), ToolError> {
        let invalid = |message: String| ToolError::InvalidInput {
            tool: tool.to_string(),
            message,
        };

        let Some(arguments) = arguments.as_object() else {
            return Err(invalid(format!("arguments must be an object, got {arguments}")));
        };

        for field in &self.fields {
            match arguments.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(invalid(format!("missing required argument '{}'", field.name)));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.kind.accepts(value) => {
                    return Err(invalid(format!(
                        "argument '{}' must be {}, got {value}",
                        field.name,
                        field.kind.as_str()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// A server tool bound to the session that discovered it.
pub struct RemoteTool {
    descriptor: ToolDescriptor,
    schema: ArgsSchema,
    session: Arc<Session>,
}

impl RemoteTool {
    pub fn new(descriptor: ToolDescriptor, session: Arc<Session>) -> Self {
        let schema = ArgsSchema::from_input_schema(descriptor.input_schema.as_ref());
        Self {
            descriptor,
            schema,
            session,
        }
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn args_schema(&self) -> &ArgsSchema {
        &self.schema
    }
}

impl std::fmt::Debug for RemoteTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTool")
            .field("descriptor", &self.descriptor)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn input_schema(&self) -> Value {
        self.descriptor
            .input_schema
            .clone()
            .unwrap_or_else(|| json!({"type": "object", "properties": {}}))
    }

    fn invoke(
        &self,
        input: Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolCallOutput, ToolError>> + Send + '_>> {
        Box::pin(async move {
            self.schema.validate(&self.descriptor.name, &input)?;
            Ok(call_remote(&self.session, &self.descriptor.name, input).await?)
        })
    }
}
