use indexmap::map::{IndexMap, IntoIter};

use super::Value;

/// A map of response keys to [`Value`]s.
///
/// Keys are unique and keep the order in which they were first added, so a
/// response object lists its fields in selection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    key_value_list: IndexMap<String, Value>,
}

impl Object {
    /// Creates a new [`Object`] value with a fixed number of preallocated
    /// slots for field-value pairs.
    #[must_use]
    pub fn with_capacity(size: usize) -> Self {
        Self {
            key_value_list: IndexMap::with_capacity(size),
        }
    }

    /// Adds a new field with a value.
    ///
    /// If there is already a field with the given key and both values are
    /// objects, they are merged. Otherwise, the existing value is replaced in
    /// place (keeping its position) and returned.
    pub fn add_field<K>(&mut self, k: K, value: Value) -> Option<Value>
    where
        K: Into<String>,
    {
        let key: String = k.into();
        match (value, self.key_value_list.get_mut(&key)) {
            (Value::Object(obj_val), Some(Value::Object(existing_obj))) => {
                for (key, val) in obj_val {
                    existing_obj.add_field(key, val);
                }
                None
            }
            (non_obj_val, _) => self.key_value_list.insert(key, non_obj_val),
        }
    }

    /// Checks whether this [`Object`] contains a field with the given name.
    pub fn contains_field<K: AsRef<str>>(&self, f: K) -> bool {
        self.key_value_list.contains_key(f.as_ref())
    }

    /// Returns an iterator over all field-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.key_value_list.iter()
    }

    /// Returns the current number of fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.key_value_list.len()
    }

    /// Returns the value for the given field.
    pub fn get_field_value<K: AsRef<str>>(&self, key: K) -> Option<&Value> {
        self.key_value_list.get(key.as_ref())
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.key_value_list.into_iter()
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl<K> FromIterator<(K, Value)> for Object
where
    K: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
    {
        let iter = iter.into_iter();
        let mut ret = Self {
            key_value_list: IndexMap::with_capacity(iter.size_hint().0),
        };
        for (k, v) in iter {
            ret.add_field(k, v);
        }
        ret
    }
}
