use crate::error::ParamsError;
use std::{borrow::Cow, str::FromStr, sync::Arc};

type ParamsMapInner = Vec<(Cow<'static, str>, String)>;

/// Path parameters captured by a match, in the order they appear in the
/// pattern.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ParamsMap(ParamsMapInner);

impl ParamsMap {
    /// Creates an empty map.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with the given capacity.
    #[inline(always)]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Inserts a value into the map, replacing any existing value for that
    /// key while keeping its position.
    pub fn insert(&mut self, key: impl Into<Cow<'static, str>>, value: String) {
        let key = key.into();
        if let Some(prev) = self.0.iter_mut().find(|(k, _)| k == &key) {
            prev.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    /// Gets the value of this param from the map.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_str(key).map(ToOwned::to_owned)
    }

    /// Gets a reference to the value of this param from the map.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find_map(|(k, v)| if k == key { Some(v.as_str()) } else { None })
    }

    /// Parses the value of this param into `T`.
    pub fn parse<T>(&self, key: &str) -> Result<T, ParamsError>
    where
        T: FromStr,
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        let value = self
            .get_str(key)
            .ok_or_else(|| ParamsError::MissingParam(key.to_string()))?;
        T::from_str(value).map_err(|e| ParamsError::Params(Arc::new(e)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ParamsMap
where
    K: Into<Cow<'static, str>>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();

        for (key, value) in iter {
            map.insert(key, value.into());
        }
        map
    }
}

impl IntoIterator for ParamsMap {
    type Item = (Cow<'static, str>, String);
    type IntoIter = std::vec::IntoIter<(Cow<'static, str>, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Builds a [`ParamsMap`] from `key => value` pairs.
#[macro_export]
macro_rules! params_map {
    ($($key:expr => $val:expr),* $(,)?) => ({
        #[allow(unused_mut)]
        let mut map = $crate::ParamsMap::new();
        $( map.insert($key, ::std::string::String::from($val)); )*
        map
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_declaration_order() {
        let map = params_map! {
            "user" => "42",
            "tab" => "posts",
        };
        let keys = map.iter().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(keys, vec!["user", "tab"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = params_map! { "a" => "1", "b" => "2" };
        map.insert("a", "3".to_string());
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_str("a"), Some("3"));
        assert_eq!(map.iter().next(), Some(("a", "3")));
    }

    #[test]
    fn parse_typed_values() {
        let map = params_map! { "id" => "17", "slug" => "hello" };
        assert_eq!(map.parse::<u32>("id"), Ok(17));
        assert_eq!(
            map.parse::<u32>("missing"),
            Err(ParamsError::MissingParam("missing".into()))
        );
        assert!(matches!(
            map.parse::<u32>("slug"),
            Err(ParamsError::Params(_))
        ));
    }

    #[test]
    fn empty_macro_builds_empty_map() {
        let map = params_map!();
        assert!(map.is_empty());
    }
}
