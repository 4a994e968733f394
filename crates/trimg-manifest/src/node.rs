//! Manifest document tree
//!
//! [`ManifestNode`] is a closed representation of one parsed YAML document.
//! Mappings keep insertion order so a rewritten document serializes with its
//! keys exactly where they were.

use std::fmt::{self, Display, Formatter};

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Ordered mapping of string keys to nodes
pub type Mapping = IndexMap<String, ManifestNode>;

/// Leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null` or `~`
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Unsigned integer beyond `i64::MAX`
    UInt(u64),
    /// Floating point
    Float(f64),
    /// String
    String(String),
}

impl Scalar {
    /// String value, if this is a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Lowercase name of the value's type
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// One node of a manifest document
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestNode {
    /// Leaf value
    Scalar(Scalar),
    /// Ordered list
    Sequence(Vec<ManifestNode>),
    /// Keyed map, insertion order preserved
    Mapping(Mapping),
}

/// Variant tag of a [`ManifestNode`], used in shape errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    /// Leaf value
    Scalar,
    /// Ordered list
    Sequence,
    /// Keyed map
    Mapping,
}

impl Display for NodeShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scalar => "scalar",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

impl ManifestNode {
    /// String scalar node
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(value.into()))
    }

    /// Null scalar node
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Variant tag
    #[inline]
    #[must_use]
    pub fn shape(&self) -> NodeShape {
        match self {
            Self::Scalar(_) => NodeShape::Scalar,
            Self::Sequence(_) => NodeShape::Sequence,
            Self::Mapping(_) => NodeShape::Mapping,
        }
    }

    /// Lowercase name of the node's type, scalars by their value type
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(scalar) => scalar.type_name(),
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// String value, if this is a string scalar
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => s.as_str(),
            _ => None,
        }
    }

    /// Mapping entries, if this is a mapping
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Sequence items, if this is a sequence
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[ManifestNode]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Value under `key`, if this is a mapping containing it
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ManifestNode> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Whether this is the null scalar
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Scalar::Null))
    }
}

impl From<Scalar> for ManifestNode {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<&str> for ManifestNode {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<Vec<ManifestNode>> for ManifestNode {
    fn from(items: Vec<ManifestNode>) -> Self {
        Self::Sequence(items)
    }
}

impl From<Mapping> for ManifestNode {
    fn from(map: Mapping) -> Self {
        Self::Mapping(map)
    }
}

impl Serialize for ManifestNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Self::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Self::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            Self::Scalar(Scalar::UInt(u)) => serializer.serialize_u64(*u),
            Self::Scalar(Scalar::Float(x)) => serializer.serialize_f64(*x),
            Self::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ManifestNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = ManifestNode;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a YAML scalar, sequence or mapping")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ManifestNode::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ManifestNode::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        ManifestNode::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Scalar::Bool(v).into())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Scalar::Int(v).into())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => Scalar::Int(i),
            Err(_) => Scalar::UInt(v),
        }
        .into())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Scalar::Float(v).into())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ManifestNode::string(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ManifestNode::string(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(ManifestNode::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = Mapping::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(key) = access.next_key::<ManifestNode>()? {
            // Non-string keys (`80: http`) are kept by their scalar text.
            let key = match key {
                ManifestNode::Scalar(scalar) => scalar.to_string(),
                other => {
                    return Err(de::Error::custom(format!(
                        "unsupported {} used as mapping key",
                        other.shape()
                    )))
                }
            };
            match map.entry(key) {
                Entry::Occupied(entry) => {
                    return Err(de::Error::custom(format!(
                        "duplicate mapping key '{}'",
                        entry.key()
                    )))
                }
                Entry::Vacant(entry) => {
                    entry.insert(access.next_value()?);
                }
            }
        }
        Ok(ManifestNode::Mapping(map))
    }

    // Tagged values (`!Ref foo`) keep their content and drop the tag.
    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Self::Value, A::Error> {
        let (_tag, variant) = data.variant::<String>()?;
        variant.newtype_variant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_shape_and_accessors() {
        let node: ManifestNode = serde_yaml::from_str("a: [1, two]\nb: null\n").unwrap();
        assert_eq!(node.shape(), NodeShape::Mapping);

        let a = node.get("a").unwrap();
        assert_eq!(a.shape(), NodeShape::Sequence);
        assert_eq!(a.as_sequence().unwrap()[1].as_str(), Some("two"));
        assert!(node.get("b").unwrap().is_null());
        assert!(node.get("missing").is_none());
    }

    #[test]
    fn scalars_keep_their_types() {
        let node: ManifestNode =
            serde_yaml::from_str("i: 3\nf: 1.5\nb: true\ns: \"3\"\nn: ~\n").unwrap();
        assert_eq!(node.get("i"), Some(&Scalar::Int(3).into()));
        assert_eq!(node.get("f"), Some(&Scalar::Float(1.5).into()));
        assert_eq!(node.get("b"), Some(&Scalar::Bool(true).into()));
        assert_eq!(node.get("s"), Some(&ManifestNode::string("3")));
        assert_eq!(node.get("n"), Some(&ManifestNode::null()));
    }

    #[test]
    fn mapping_preserves_key_order() {
        let node: ManifestNode = serde_yaml::from_str("zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        let keys: Vec<_> = node.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let out = serde_yaml::to_string(&node).unwrap();
        assert_eq!(out, "zeta: 1\nalpha: 2\nmid: 3\n");
    }

    #[test]
    fn numeric_keys_become_strings() {
        let node: ManifestNode = serde_yaml::from_str("80: http\n").unwrap();
        assert_eq!(node.get("80").and_then(ManifestNode::as_str), Some("http"));
    }

    #[test]
    fn key_colliding_with_stringified_number_is_rejected() {
        let err = serde_yaml::from_str::<ManifestNode>("kind: ConfigMap\ndata:\n  80: a\n  \"80\": b\n")
            .unwrap_err();
        assert!(err.to_string().contains("duplicate mapping key '80'"), "{err}");
    }

    #[test]
    fn tagged_values_keep_content() {
        let node: ManifestNode = serde_yaml::from_str("value: !Custom inner\n").unwrap();
        assert_eq!(node.get("value").and_then(ManifestNode::as_str), Some("inner"));
    }
}
