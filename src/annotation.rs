//! Data model for parsed annotations and declaration references.

use crate::error::ResolveError;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of declaration an annotation map belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Class,
    Method,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclKind::Class => "class",
            DeclKind::Method => "method",
        })
    }
}

/// Parsed annotations of one declaration: annotation name mapped to its
/// normalized text value.
///
/// Entries keep the order in which names first appeared in the comment.
/// A name occurring twice keeps its original position but takes the later
/// value (last write wins). Lookups are linear; doc blocks hold a handful
/// of annotations at most.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationMap {
    entries: Vec<(String, String)>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an annotation, overwriting the value in place if the name is
    /// already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value.into(),
            None => self.entries.push((name, value.into())),
        }
    }

    /// Value of the named annotation. `Some("")` is a present annotation
    /// with an empty value, distinct from `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name/value pairs in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Annotation names in first-occurrence order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl FromIterator<(String, String)> for AnnotationMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl Serialize for AnnotationMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Reference to a class method, either as a qualified string
/// (`"app.Foo::bar"` or `"app.Foo#bar"`) or as a class/method pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRef<'a> {
    Qualified(&'a str),
    Pair(&'a str, &'a str),
}

impl<'a> MethodRef<'a> {
    /// Split into `(class, method)` parts. Missing separator or an empty
    /// part is a malformed reference.
    pub fn split(self) -> Result<(&'a str, &'a str), ResolveError> {
        let (class, method) = match self {
            MethodRef::Qualified(s) => s
                .split_once("::")
                .or_else(|| s.split_once('#'))
                .ok_or_else(|| ResolveError::MalformedReference(s.to_string()))?,
            MethodRef::Pair(class, method) => (class, method),
        };
        if class.is_empty() || method.is_empty() {
            return Err(ResolveError::MalformedReference(self.to_string()));
        }
        Ok((class, method))
    }
}

impl<'a> From<&'a str> for MethodRef<'a> {
    fn from(s: &'a str) -> Self {
        MethodRef::Qualified(s)
    }
}

impl<'a> From<(&'a str, &'a str)> for MethodRef<'a> {
    fn from((class, method): (&'a str, &'a str)) -> Self {
        MethodRef::Pair(class, method)
    }
}

impl fmt::Display for MethodRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodRef::Qualified(s) => f.write_str(s),
            MethodRef::Pair(class, method) => write!(f, "{}::{}", class, method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_first_occurrence_order() {
        let mut map = AnnotationMap::new();
        map.insert("b", "1");
        map.insert("a", "2");
        map.insert("b", "3");

        let names: Vec<_> = map.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(map.get("b"), Some("3"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_empty_value_distinct_from_absent() {
        let mut map = AnnotationMap::new();
        map.insert("flag", "");

        assert_eq!(map.get("flag"), Some(""));
        assert_eq!(map.get("missing"), None);
        assert!(map.contains("flag"));
        assert!(!map.contains("missing"));
    }

    #[test]
    fn test_serializes_as_json_object_in_order() {
        let mut map = AnnotationMap::new();
        map.insert("package", "app");
        map.insert("auth", "");

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"package":"app","auth":""}"#);
    }

    #[test]
    fn test_method_ref_qualified_double_colon() {
        let r = MethodRef::from("app.Foo::bar");
        assert_eq!(r.split().unwrap(), ("app.Foo", "bar"));
    }

    #[test]
    fn test_method_ref_qualified_hash() {
        let r = MethodRef::from("app.Foo#bar");
        assert_eq!(r.split().unwrap(), ("app.Foo", "bar"));
    }

    #[test]
    fn test_method_ref_pair() {
        let r = MethodRef::from(("app.Foo", "bar"));
        assert_eq!(r.split().unwrap(), ("app.Foo", "bar"));
    }

    #[test]
    fn test_method_ref_without_separator_is_malformed() {
        let err = MethodRef::from("justaclass").split().unwrap_err();
        assert_eq!(
            err,
            ResolveError::MalformedReference("justaclass".to_string())
        );
    }

    #[test]
    fn test_method_ref_empty_part_is_malformed() {
        assert!(MethodRef::from("::bar").split().is_err());
        assert!(MethodRef::from("app.Foo::").split().is_err());
        assert!(MethodRef::from(("", "bar")).split().is_err());
        assert!(MethodRef::from(("app.Foo", "")).split().is_err());
    }
}
