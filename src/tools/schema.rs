// ABOUTME: JSON Schema types describing tool inputs, plus argument validation
// ABOUTME: Schemas feed the planner brief and the tool discovery endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Tool Schemas
//!
//! Every tool publishes a `JsonSchema` for its arguments. The registry uses
//! it in two ways: rendered into the planner brief so the LLM knows what
//! each tool accepts, and checked against planned arguments before a tool
//! runs so malformed plans fail as `InvalidInput` instead of deep inside a
//! tool.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

/// Schema describing one tool for discovery and planning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonSchema,
}

/// JSON Schema definition for tool arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, PropertySchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// Schema for a single property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySchema {
    /// String property with a description
    #[must_use]
    pub fn string(description: &str) -> Self {
        Self {
            property_type: "string".to_owned(),
            description: Some(description.to_owned()),
        }
    }

    /// Number property with a description
    #[must_use]
    pub fn number(description: &str) -> Self {
        Self {
            property_type: "number".to_owned(),
            description: Some(description.to_owned()),
        }
    }

    /// Integer property with a description
    #[must_use]
    pub fn integer(description: &str) -> Self {
        Self {
            property_type: "integer".to_owned(),
            description: Some(description.to_owned()),
        }
    }
}

impl JsonSchema {
    /// Object schema with the given properties and required keys
    #[must_use]
    pub fn object(
        properties: Vec<(&str, PropertySchema)>,
        required: Vec<&str>,
    ) -> Self {
        Self {
            schema_type: "object".to_owned(),
            properties: Some(
                properties
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v))
                    .collect(),
            ),
            required: if required.is_empty() {
                None
            } else {
                Some(required.into_iter().map(str::to_owned).collect())
            },
        }
    }

    /// Object schema with no parameters
    #[must_use]
    pub fn empty_object() -> Self {
        Self {
            schema_type: "object".to_owned(),
            properties: None,
            required: None,
        }
    }

    /// Validate planned arguments against this schema
    ///
    /// Checks that `args` is an object, that every required key is present
    /// and non-null, and that values loosely match the declared types.
    /// Planner-produced arguments come from an LLM, so unknown extra keys
    /// are tolerated.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` describing the first violation found.
    pub fn validate_args(&self, args: &Value) -> AppResult<()> {
        let Some(map) = args.as_object() else {
            return Err(AppError::invalid_input("Tool arguments must be an object"));
        };

        if let Some(required) = &self.required {
            for key in required {
                match map.get(key) {
                    None | Some(Value::Null) => {
                        return Err(AppError::invalid_input(format!(
                            "Missing required argument: {key}"
                        )));
                    }
                    Some(_) => {}
                }
            }
        }

        if let Some(properties) = &self.properties {
            for (key, value) in map {
                let Some(prop) = properties.get(key) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                let matches = match prop.property_type.as_str() {
                    "string" => value.is_string(),
                    "number" => value.is_number(),
                    "integer" => value.is_i64() || value.is_u64(),
                    "boolean" => value.is_boolean(),
                    "object" => value.is_object(),
                    "array" => value.is_array(),
                    _ => true,
                };
                if !matches {
                    return Err(AppError::invalid_input(format!(
                        "Argument '{key}' must be a {}",
                        prop.property_type
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn location_schema() -> JsonSchema {
        JsonSchema::object(
            vec![
                ("location", PropertySchema::string("City or place name")),
                ("method", PropertySchema::integer("Calculation method 1-12")),
            ],
            vec!["location"],
        )
    }

    #[test]
    fn test_valid_args_pass() {
        let schema = location_schema();
        assert!(schema
            .validate_args(&json!({"location": "Cairo", "method": 2}))
            .is_ok());
    }

    #[test]
    fn test_missing_required_key() {
        let schema = location_schema();
        let err = schema.validate_args(&json!({"method": 2})).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[test]
    fn test_wrong_type_rejected() {
        let schema = location_schema();
        let err = schema
            .validate_args(&json!({"location": "Cairo", "method": "two"}))
            .unwrap_err();
        assert!(err.message.contains("method"));
    }

    #[test]
    fn test_unknown_keys_tolerated() {
        let schema = location_schema();
        assert!(schema
            .validate_args(&json!({"location": "Cairo", "extra": true}))
            .is_ok());
    }

    #[test]
    fn test_non_object_rejected() {
        let schema = JsonSchema::empty_object();
        assert!(schema.validate_args(&json!("just a string")).is_err());
    }
}
