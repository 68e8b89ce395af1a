//! serde model of the JSON netlist interchange format.
//!
//! The format serializes exactly the data model in `silt-netlist`, except
//! that signals are flattened to vectors of design-global net-bit indices.
//! A bit is either an integer index or one of the literal strings `"0"`,
//! `"1"`, `"x"`, `"z"`.
use linked_hash_map::LinkedHashMap;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct JsonDesign {
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub modules: LinkedHashMap<String, JsonModule>,
}

#[derive(Debug, Deserialize)]
pub struct JsonModule {
    #[serde(default)]
    pub attributes: LinkedHashMap<String, JsonAttr>,
    #[serde(default)]
    pub ports: LinkedHashMap<String, JsonPort>,
    #[serde(default)]
    pub cells: LinkedHashMap<String, JsonCell>,
    #[serde(default)]
    pub netnames: LinkedHashMap<String, JsonNet>,
}

#[derive(Debug, Deserialize)]
pub struct JsonPort {
    pub direction: JsonDirection,
    pub bits: Vec<JsonBit>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JsonDirection {
    Input,
    Output,
    Inout,
}

#[derive(Debug, Deserialize)]
pub struct JsonCell {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub attributes: LinkedHashMap<String, JsonAttr>,
    #[serde(default)]
    pub parameters: LinkedHashMap<String, JsonAttr>,
    #[serde(default)]
    pub connections: LinkedHashMap<String, Vec<JsonBit>>,
}

#[derive(Debug, Deserialize)]
pub struct JsonNet {
    pub bits: Vec<JsonBit>,
    #[serde(default)]
    pub attributes: LinkedHashMap<String, JsonAttr>,
}

/// A net bit: a global index, or a constant bit spelled as a string.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum JsonBit {
    Index(u64),
    Literal(String),
}

/// Attribute and parameter values: plain integers, or MSB-first bit strings
/// for values wider than what JSON numbers carry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum JsonAttr {
    Int(u64),
    Str(String),
}
