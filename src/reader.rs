//! The public annotation query API: resolution, lazy parsing, caching.

use crate::annotation::{AnnotationMap, MethodRef};
use crate::cache::AnnotationCache;
use crate::error::ResolveError;
use crate::index::CommentSource;
use crate::parser;
use std::sync::Arc;

/// Annotation lookups over a comment source, memoized per declaration.
///
/// The reader owns its cache, so a freshly constructed reader starts
/// cold; construct one per test for isolation. References are resolved
/// to canonical identities before the cache is consulted, which makes
/// alias references (short class names, `::` vs `#` method forms) share
/// a single cached entry.
pub struct AnnotationReader<S> {
    source: S,
    cache: AnnotationCache,
}

impl<S: CommentSource> AnnotationReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: AnnotationCache::new(),
        }
    }

    /// The comment source this reader queries.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The reader's cache, one entry per distinct resolved identity.
    pub fn cache(&self) -> &AnnotationCache {
        &self.cache
    }

    /// All annotations on a class.
    ///
    /// A reference containing `::` or `#` is taken as a method reference;
    /// the method is resolved and its class's annotations are returned.
    /// A resolved class without a doc comment yields an empty map, which
    /// is not an error.
    pub fn annotations_for_class(
        &self,
        reference: &str,
    ) -> Result<Arc<AnnotationMap>, ResolveError> {
        let identity = self.resolve_class_reference(reference)?;
        Ok(self.fetch(&identity))
    }

    /// Value of one class annotation. `Ok(None)` means the class resolved
    /// but the annotation is absent; `Ok(Some(""))` is a present
    /// annotation with an empty value.
    pub fn annotation_for_class(
        &self,
        reference: &str,
        name: &str,
    ) -> Result<Option<String>, ResolveError> {
        let map = self.annotations_for_class(reference)?;
        Ok(map.get(name).map(str::to_string))
    }

    /// All annotations on a method, referenced either as a qualified
    /// string (`"Class::method"`, `"Class#method"`) or a
    /// `(class, method)` pair.
    pub fn annotations_for_method<'a>(
        &self,
        reference: impl Into<MethodRef<'a>>,
    ) -> Result<Arc<AnnotationMap>, ResolveError> {
        let (class, method) = reference.into().split()?;
        let identity = self.source.resolve_method(class, method)?;
        Ok(self.fetch(&identity))
    }

    /// Value of one method annotation, with the same absent-vs-empty
    /// distinction as [`annotation_for_class`](Self::annotation_for_class).
    pub fn annotation_for_method<'a>(
        &self,
        reference: impl Into<MethodRef<'a>>,
        name: &str,
    ) -> Result<Option<String>, ResolveError> {
        let map = self.annotations_for_method(reference)?;
        Ok(map.get(name).map(str::to_string))
    }

    fn resolve_class_reference(&self, reference: &str) -> Result<String, ResolveError> {
        if reference.contains("::") || reference.contains('#') {
            // Method reference given for a class query: resolve the
            // method, then take its class part.
            let (class, method) = MethodRef::from(reference).split()?;
            let identity = self.source.resolve_method(class, method)?;
            return Ok(match identity.split_once('#') {
                Some((class, _)) => class.to_string(),
                None => identity,
            });
        }
        self.source.resolve_class(reference)
    }

    fn fetch(&self, identity: &str) -> Arc<AnnotationMap> {
        self.cache.get_or_parse(identity, || {
            tracing::debug!("parsing annotations for {}", identity);
            let comment = self.source.doc_comment(identity).unwrap_or_default();
            parser::parse_comment(&comment)
        })
    }
}
