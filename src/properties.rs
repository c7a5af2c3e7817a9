//! Typed key/value property bags attached to maps, tilesets, tiles, layers
//! and objects.

use crate::error::{EngineError, Result};
use crate::tilemap::raw::{RawProperties, RawProperty};
use macroquad::prelude::Color;
use std::collections::BTreeMap;

/// One custom property value, typed by its Tiled `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `bool`
    Bool(bool),
    /// `int`
    Int(i64),
    /// `float`
    Float(f32),
    /// `string`, the default type.
    String(String),
    /// `color`, parsed from `#AARRGGBB` or `#RRGGBB`.
    Color(Color),
    /// Path as written in the document (relative to the declaring file).
    File(String),
    /// Referenced object id, 0 when unset.
    Object(u32),
    /// Custom class property; nested members are not kept.
    Class(String),
}

/// Properties by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, PropertyValue>,
}

impl Properties {
    /// An empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_raw(raw: Option<RawProperties>) -> Result<Self> {
        let mut out = Self::new();
        if let Some(raw) = raw {
            for prop in raw.items {
                let (name, value) = parse_property(prop)?;
                out.insert(name, value);
            }
        }
        Ok(out)
    }

    /// Sets `name`, replacing an earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.values.insert(name.into(), value);
    }

    /// The value of `name`, whatever its type.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    /// Whether `name` is set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// A `bool` property.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// An `int` or `object` property.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Object(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// `None` when the stored integer does not fit in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// A `float` property.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// A `string`, `file` or `class` property.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(s) | PropertyValue::File(s) | PropertyValue::Class(s) => {
                Some(s.as_str())
            }
            _ => None,
        }
    }

    /// A `color` property.
    pub fn get_color(&self, name: &str) -> Option<Color> {
        match self.get(name)? {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Properties sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no properties.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn parse_property(prop: RawProperty) -> Result<(String, PropertyValue)> {
    let RawProperty {
        name,
        kind,
        property_type,
        value,
        text,
    } = prop;
    // Multi-line strings are stored as element text instead of an attribute.
    let raw = value.or(text).unwrap_or_default();
    let kind = kind.unwrap_or_else(|| "string".to_owned());

    let invalid = |name: &str, kind: &str, raw: &str| EngineError::InvalidPropertyValue {
        name: name.to_owned(),
        kind: kind.to_owned(),
        value: raw.to_owned(),
    };

    let parsed = match kind.as_str() {
        "string" => PropertyValue::String(raw),
        "file" => PropertyValue::File(raw),
        "bool" => match raw.as_str() {
            "true" | "1" => PropertyValue::Bool(true),
            "false" | "0" => PropertyValue::Bool(false),
            _ => return Err(invalid(&name, &kind, &raw)),
        },
        "int" => PropertyValue::Int(raw.trim().parse().map_err(|_| invalid(&name, &kind, &raw))?),
        "float" => {
            PropertyValue::Float(raw.trim().parse().map_err(|_| invalid(&name, &kind, &raw))?)
        }
        "object" => {
            if raw.is_empty() {
                PropertyValue::Object(0)
            } else {
                PropertyValue::Object(raw.trim().parse().map_err(|_| invalid(&name, &kind, &raw))?)
            }
        }
        "color" => {
            if raw.is_empty() {
                PropertyValue::Color(Color::new(0.0, 0.0, 0.0, 0.0))
            } else {
                PropertyValue::Color(parse_color(&raw).ok_or_else(|| invalid(&name, &kind, &raw))?)
            }
        }
        "class" => PropertyValue::Class(property_type.unwrap_or_default()),
        other => {
            return Err(EngineError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            })
        }
    };
    Ok((name, parsed))
}

/// Parses Tiled colors: `#AARRGGBB` or `#RRGGBB` (the `#` is optional).
pub fn parse_color(text: &str) -> Option<Color> {
    let hex = text.trim().trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let (a, r, g, b) = match hex.len() {
        8 => (channel(0)?, channel(2)?, channel(4)?, channel(6)?),
        6 => (255, channel(0)?, channel(2)?, channel(4)?),
        _ => return None,
    };
    Some(Color::from_rgba(r, g, b, a))
}
