//! Tool input schemas and validation

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::ToolError;

/// Declared type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    /// A string of exactly one character
    Char,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// JSON Schema type name
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamType::String | ParamType::Char => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Char => value
                .as_str()
                .map(|s| s.chars().count() == 1)
                .unwrap_or(false),
            ParamType::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
            }
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

impl ParamSpec {
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// Ordered parameter list of a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Checks the schema itself: names must be non-empty and unique
    pub fn check(&self) -> Result<(), ToolError> {
        let mut seen = HashSet::new();
        for param in &self.params {
            if param.name.trim().is_empty() {
                return Err(ToolError::InvalidDescriptor(
                    "parameter name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(ToolError::InvalidDescriptor(format!(
                    "parameter '{}' is declared twice",
                    param.name
                )));
            }
        }
        Ok(())
    }

    /// JSON Schema presented to the reasoning engine
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut prop = json!({
                "type": param.param_type.json_type(),
                "description": param.description,
            });
            if param.param_type == ParamType::Char {
                prop["minLength"] = json!(1);
                prop["maxLength"] = json!(1);
            }
            properties.insert(param.name.clone(), prop);
            if param.required {
                required.push(param.name.clone());
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validates raw input and returns the declared, non-null values.
    ///
    /// Parameters are checked in declaration order; the first failure wins.
    /// `null` counts as absent. Undeclared names are rejected after all
    /// declared parameters pass.
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>, ToolError> {
        let empty = Map::new();
        let args = match input {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(ToolError::Validation(
                    "input must be a JSON object".to_string(),
                ))
            }
        };

        let mut validated = Map::new();
        for param in &self.params {
            match args.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(ToolError::Validation(format!(
                            "missing required parameter '{}'",
                            param.name
                        )));
                    }
                }
                Some(value) if !param.param_type.matches(value) => {
                    return Err(ToolError::Validation(type_mismatch(param, value)));
                }
                Some(value) => {
                    validated.insert(param.name.clone(), value.clone());
                }
            }
        }

        let mut unexpected: Vec<&String> = args
            .keys()
            .filter(|key| self.get(key).is_none())
            .collect();
        unexpected.sort();
        if let Some(name) = unexpected.first() {
            return Err(ToolError::Validation(format!(
                "unexpected parameter '{}'",
                name
            )));
        }

        Ok(validated)
    }
}

fn type_mismatch(param: &ParamSpec, value: &Value) -> String {
    if param.param_type == ParamType::Char && value.is_string() {
        return format!("parameter '{}' must be exactly one character", param.name);
    }
    format!(
        "parameter '{}' must be of type {}, got {}",
        param.name,
        param.param_type.json_type(),
        value_kind(value)
    )
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
