// Typed tool schemas and uniform argument validation
//
// Design decisions:
// - Schemas are typed values, not hand-written JSON blobs; `to_value()` renders
//   the JSON Schema object handed to the model's function-calling interface
// - Requiredness is a flag on the parameter itself, so `required` can never
//   name a parameter that does not exist in `properties`
// - Validation runs once at the dispatch boundary, before any handler code;
//   handlers receive a `ToolArguments` view with declared defaults filled in
// - Validation failures are in-band data (plain strings), never errors or panics

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Schema problems detected when an agent is registered.
///
/// These are programming errors in an agent definition, not runtime
/// conditions, so they surface once at registration and never during dispatch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("tool name must not be empty")]
    EmptyToolName,

    #[error("duplicate parameter '{0}'")]
    DuplicateParam(String),

    #[error("parameter '{0}' is required but declares a default")]
    RequiredWithDefault(String),

    #[error("default for parameter '{0}' does not match its declared type")]
    DefaultTypeMismatch(String),

    #[error("enum value for parameter '{0}' does not match its declared type")]
    EnumTypeMismatch(String),
}

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    /// The `type` keyword value used in the rendered JSON Schema
    pub fn as_json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        }
    }

    /// Check whether a JSON value inhabits this kind
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Array => value.is_array(),
            ParamKind::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_json_type())
    }
}

/// A single named tool parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    name: String,
    kind: ParamKind,
    description: String,
    required: bool,
    allowed: Option<Vec<Value>>,
    default: Option<Value>,
}

impl ParamSpec {
    /// Declare a required parameter
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            allowed: None,
            default: None,
        }
    }

    /// Declare an optional parameter
    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            allowed: None,
            default: None,
        }
    }

    /// Restrict the parameter to a fixed set of values
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Declare a default applied when the caller omits the parameter.
    ///
    /// Only meaningful for optional parameters; a required parameter with a
    /// default is rejected at registration.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// True if the caller must supply this parameter
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Declared schema of one tool: name, description, and ordered parameters.
///
/// The parameter order is the presentation order in the rendered JSON and in
/// `params()`; it has no effect on validation or dispatch.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    name: String,
    description: String,
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    /// Create a schema with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter (fluent)
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Tool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tool description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared parameters in presentation order
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Validate the schema itself.
    ///
    /// Called once when the owning agent is registered.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyToolName);
        }

        for (i, spec) in self.params.iter().enumerate() {
            if self.params[..i].iter().any(|p| p.name == spec.name) {
                return Err(SchemaError::DuplicateParam(spec.name.clone()));
            }
            if let Some(default) = &spec.default {
                if spec.required {
                    return Err(SchemaError::RequiredWithDefault(spec.name.clone()));
                }
                if !spec.kind.matches(default) {
                    return Err(SchemaError::DefaultTypeMismatch(spec.name.clone()));
                }
            }
            if let Some(allowed) = &spec.allowed {
                if allowed.iter().any(|v| !spec.kind.matches(v)) {
                    return Err(SchemaError::EnumTypeMismatch(spec.name.clone()));
                }
            }
        }

        Ok(())
    }

    /// Render the JSON Schema object presented to the model.
    ///
    /// Shape: `{"type": "object", "properties": {...}, "required": [...],
    /// "additionalProperties": false}`.
    pub fn to_value(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for spec in &self.params {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(spec.kind.as_json_type()));
            prop.insert("description".to_string(), json!(spec.description));
            if let Some(allowed) = &spec.allowed {
                prop.insert("enum".to_string(), Value::Array(allowed.clone()));
            }
            if let Some(default) = &spec.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(spec.name.clone(), Value::Object(prop));

            if spec.required {
                required.push(json!(spec.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    /// Render the full tool definition (name + description + parameters).
    ///
    /// This is the per-tool entry in an agent descriptor.
    pub fn to_definition_value(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.to_value(),
        })
    }

    /// Validate incoming arguments against this schema.
    ///
    /// On success returns the arguments with declared defaults filled in.
    /// On failure returns the in-band message for the model; validation never
    /// panics and never produces an internal error.
    ///
    /// A `null` payload is treated as an empty object (models frequently send
    /// no arguments that way), and an explicit `null` for an optional
    /// parameter is treated as omitted.
    pub fn check_args(&self, arguments: &Value) -> Result<ToolArguments, String> {
        let provided: Map<String, Value> = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => return Err("Tool arguments must be a JSON object".to_string()),
        };

        let mut values = Map::new();

        for spec in &self.params {
            match provided.get(&spec.name) {
                Some(Value::Null) | None => {
                    if spec.required {
                        return Err(format!("Missing required parameter: {}", spec.name));
                    }
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.clone(), default.clone());
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(format!(
                            "Invalid type for parameter '{}': expected {}",
                            spec.name, spec.kind
                        ));
                    }
                    if let Some(allowed) = &spec.allowed {
                        if !allowed.contains(value) {
                            let options = allowed
                                .iter()
                                .map(render_enum_option)
                                .collect::<Vec<_>>()
                                .join(", ");
                            return Err(format!(
                                "Invalid value for parameter '{}': must be one of {}",
                                spec.name, options
                            ));
                        }
                    }
                    values.insert(spec.name.clone(), value.clone());
                }
            }
        }

        for key in provided.keys() {
            if !self.params.iter().any(|p| p.name == *key) {
                return Err(format!("Unknown parameter: {}", key));
            }
        }

        Ok(ToolArguments { values })
    }
}

fn render_enum_option(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Validated tool arguments with defaults applied.
///
/// Accessors return `None` for parameters the caller omitted (and that had no
/// default); for required parameters validation has already guaranteed
/// presence and type.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    /// Raw JSON value of a parameter
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String parameter
    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_str())
    }

    /// Integer parameter as i64
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(|v| v.as_i64())
    }

    /// Integer parameter as u64
    pub fn u64(&self, name: &str) -> Option<u64> {
        self.values.get(name).and_then(|v| v.as_u64())
    }

    /// Numeric parameter as f64
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(|v| v.as_f64())
    }

    /// Boolean parameter
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(|v| v.as_bool())
    }

    /// True if the parameter is present (supplied or defaulted)
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of present parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no parameters are present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
