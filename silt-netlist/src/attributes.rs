use crate::Const;
use linked_hash_map::LinkedHashMap;
use silt_utils::Id;

/// Attribute annotations on design objects, in insertion order.
///
/// Attribute values are constants; boolean attributes are any value with a
/// set bit.
#[derive(Clone, Debug, Default)]
pub struct Attributes {
    map: LinkedHashMap<Id, Const>,
}

impl Attributes {
    pub fn insert<K: Into<Id>>(&mut self, key: K, value: Const) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Const> {
        self.map.get(&Id::new(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.map.contains_key(&Id::new(key))
    }

    /// True when the attribute is present with any set bit.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).map(Const::as_bool).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Id, &Const)> {
        self.map.iter()
    }
}
