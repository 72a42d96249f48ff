//! Options consumed by the resolver.
//!
//! Options are plain data. Loading them from disk is the job of the `lsz`
//! facade (`lsz::config`); this module only defines the shape and the
//! lenient JSON decoding rules.

use crate::limits::MAX_CLASS_DEPTH;
use serde::{Deserialize, Deserializer, Serialize};

/// Accepts both booleans and the usual string spellings of booleans.
///
/// Hand-written settings files routinely contain `"literalNarrowing": "off"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::custom(format!(
                "invalid boolean value: '{s}'. Expected true, false, 'true', or 'false'"
            ))),
        },
    }
}

const fn default_true() -> bool {
    true
}

fn default_delegation_constructor() -> String {
    "setmetatable".to_string()
}

fn default_delegation_field() -> String {
    "__index".to_string()
}

const fn default_max_class_depth() -> u32 {
    MAX_CLASS_DEPTH
}

/// Tunables for node resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferOptions {
    /// Literal initializers still contribute when an annotation matched.
    #[serde(default = "default_true", deserialize_with = "deserialize_bool_or_string")]
    pub literal_narrowing: bool,

    /// Link an explicit leading `self` parameter of `obj.f = function(self)`
    /// to `obj`, the same way `function obj:f()` binds its implicit receiver.
    #[serde(default = "default_true", deserialize_with = "deserialize_bool_or_string")]
    pub self_parameter_linking: bool,

    /// Global function treated as "construct with delegation".
    #[serde(default = "default_delegation_constructor")]
    pub delegation_constructor: String,

    /// Field of the second argument that delegation follows.
    #[serde(default = "default_delegation_field")]
    pub delegation_field: String,

    /// Depth limit for `extends` chains.
    #[serde(default = "default_max_class_depth")]
    pub max_class_depth: u32,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            literal_narrowing: true,
            self_parameter_linking: true,
            delegation_constructor: default_delegation_constructor(),
            delegation_field: default_delegation_field(),
            max_class_depth: MAX_CLASS_DEPTH,
        }
    }
}

impl InferOptions {
    /// Decode options from a JSON document. Missing keys take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
