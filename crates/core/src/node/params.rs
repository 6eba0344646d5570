use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{color::Rgba, Result, VizError};

/// Value stored under a node parameter key.
///
/// Deserializes untagged so configuration files can write plain JSON
/// numbers, booleans and strings. Colours are written as hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Color(Rgba),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "text",
            ParamValue::Color(_) => "color",
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value as f64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<Rgba> for ParamValue {
    fn from(value: Rgba) -> Self {
        ParamValue::Color(value)
    }
}

/// Named parameters held by an effect node.
///
/// Storing never fails; the typed getters check the stored value when the
/// node reads it and fall back to the node's default when the key is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeParams {
    values: BTreeMap<String, ParamValue>,
}

impl NodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn float(&self, key: &str, default: f32) -> Result<f32> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Float(v)) => Ok(*v as f32),
            Some(ParamValue::Int(v)) => Ok(*v as f32),
            Some(other) => Err(mismatch(key, "number", other)),
        }
    }

    /// Non-negative integer parameter. Floats are truncated.
    pub fn count(&self, key: &str, default: usize) -> Result<usize> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Int(v)) if *v >= 0 => Ok(*v as usize),
            Some(ParamValue::Float(v)) if *v >= 0.0 => Ok(*v as usize),
            Some(ParamValue::Int(_)) | Some(ParamValue::Float(_)) => Err(
                VizError::invalid_param(key, "expected a non-negative count"),
            ),
            Some(other) => Err(mismatch(key, "count", other)),
        }
    }

    /// Like [`NodeParams::count`], but values above `max` are rejected.
    pub fn count_up_to(&self, key: &str, default: usize, max: usize) -> Result<usize> {
        let value = self.count(key, default)?;
        if value > max {
            return Err(VizError::invalid_param(
                key,
                format!("{value} exceeds the maximum of {max}"),
            ));
        }
        Ok(value)
    }

    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(other) => Err(mismatch(key, "bool", other)),
        }
    }

    pub fn text<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Text(v)) => Ok(v.as_str()),
            Some(other) => Err(mismatch(key, "text", other)),
        }
    }

    /// Colour parameter, stored either as [`Rgba`] or as a hex string.
    pub fn color(&self, key: &str, default: Rgba) -> Result<Rgba> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Color(c)) => Ok(*c),
            Some(ParamValue::Text(hex)) => Rgba::from_hex(hex)
                .map_err(|err| VizError::invalid_param(key, err.to_string())),
            Some(other) => Err(mismatch(key, "color", other)),
        }
    }
}

fn mismatch(key: &str, expected: &str, found: &ParamValue) -> VizError {
    VizError::invalid_param(key, format!("expected {expected}, found {}", found.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_fall_back_to_defaults() {
        let params = NodeParams::new();
        assert_eq!(params.float("gain", 1.5).unwrap(), 1.5);
        assert_eq!(params.count("bars", 32).unwrap(), 32);
        assert!(params.flag("mirror", true).unwrap());
        assert_eq!(params.text("shape", "ring").unwrap(), "ring");
        assert_eq!(params.color("color", Rgba::BLACK).unwrap(), Rgba::BLACK);
    }

    #[test]
    fn numbers_convert_between_int_and_float() {
        let mut params = NodeParams::new();
        params.set("gain", 2);
        params.set("bars", 12.7_f32);
        assert_eq!(params.float("gain", 0.0).unwrap(), 2.0);
        assert_eq!(params.count("bars", 0).unwrap(), 12);
    }

    #[test]
    fn type_mismatches_are_errors() {
        let mut params = NodeParams::new();
        params.set("gain", "loud");
        params.set("bars", -3);
        params.set("color", "#nothex");

        let err = params.float("gain", 0.0).unwrap_err();
        assert!(err.to_string().contains("gain"));
        assert!(params.count("bars", 0).is_err());
        assert!(params.color("color", Rgba::WHITE).is_err());
    }

    #[test]
    fn bounded_counts_reject_large_values() {
        let mut params = NodeParams::new();
        params.set("points", 1e30_f64);
        params.set("layers", 64);
        let err = params.count_up_to("points", 8, 1024).unwrap_err();
        assert!(matches!(err, VizError::InvalidParameter { ref key, .. } if key == "points"));
        assert_eq!(params.count_up_to("layers", 6, 64).unwrap(), 64);
        assert_eq!(params.count_up_to("missing", 6, 64).unwrap(), 6);
    }

    #[test]
    fn colours_parse_from_hex_text() {
        let mut params = NodeParams::new();
        params.set("color", "#ff0000");
        assert_eq!(params.color("color", Rgba::BLACK).unwrap(), Rgba::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn deserializes_plain_json_values() {
        let params: NodeParams =
            serde_json::from_str(r#"{ "bars": 16, "gain": 1.5, "mirror": false, "shape": "wave" }"#)
                .unwrap();
        assert_eq!(params.get("bars"), Some(&ParamValue::Int(16)));
        assert_eq!(params.get("gain"), Some(&ParamValue::Float(1.5)));
        assert_eq!(params.get("mirror"), Some(&ParamValue::Bool(false)));
        assert_eq!(params.text("shape", "").unwrap(), "wave");
        assert_eq!(params.len(), 4);
    }
}
