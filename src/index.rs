//! Declaration metadata: the comment locator contract and the in-memory
//! index that implements it.

use crate::error::ResolveError;
use std::path::{Path, PathBuf};

/// Where annotation queries find declarations and their raw doc comments.
///
/// Implementations resolve user-supplied references to canonical
/// identities up front, so resolution failures surface before any comment
/// is fetched. `doc_comment` is only consulted on a cache miss; a `None`
/// there means the declaration exists but carries no documentation.
pub trait CommentSource {
    /// Canonical identity for a class reference, or why it failed.
    fn resolve_class(&self, reference: &str) -> Result<String, ResolveError>;

    /// Canonical `Class#method` identity, or why it failed. Must match
    /// exactly one method.
    fn resolve_method(&self, class: &str, method: &str) -> Result<String, ResolveError>;

    /// Raw documentation text (delimiters included) for a canonical
    /// identity. `None` when the declaration has no doc comment.
    fn doc_comment(&self, identity: &str) -> Option<String>;
}

/// Pre-extracted table of class and method declarations.
///
/// Identities are dot-qualified (`app.Foo`); method identities append
/// `#name`. References passed to the resolve methods may use `\` or `.`
/// as namespace separators and may omit the namespace entirely, in which
/// case the reference resolves if exactly one indexed class ends with it.
#[derive(Debug, Default)]
pub struct DeclarationIndex {
    classes: Vec<ClassEntry>,
}

/// One indexed class with its methods.
#[derive(Debug)]
pub struct ClassEntry {
    identity: String,
    name: String,
    file: Option<PathBuf>,
    line: Option<usize>,
    comment: Option<String>,
    methods: Vec<MethodEntry>,
}

/// One indexed method of a class.
#[derive(Debug)]
pub struct MethodEntry {
    name: String,
    line: Option<usize>,
    comment: Option<String>,
}

/// Canonical identity form: `\`-separators become `.`, outer dots drop.
fn normalize(reference: &str) -> String {
    reference.replace('\\', ".").trim_matches('.').to_string()
}

impl DeclarationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class (or fetch it if already present) and return it for
    /// further population. The identity is normalized on the way in.
    pub fn add_class(&mut self, identity: impl Into<String>) -> &mut ClassEntry {
        let identity = normalize(&identity.into());
        let pos = match self.classes.iter().position(|c| c.identity == identity) {
            Some(pos) => pos,
            None => {
                let name = identity.rsplit('.').next().unwrap_or("").to_string();
                self.classes.push(ClassEntry {
                    identity,
                    name,
                    file: None,
                    line: None,
                    comment: None,
                    methods: Vec::new(),
                });
                self.classes.len() - 1
            }
        };
        &mut self.classes[pos]
    }

    /// Add a method under a class, creating the class if needed.
    pub fn add_method(
        &mut self,
        class_identity: impl Into<String>,
        method: impl Into<String>,
    ) -> &mut MethodEntry {
        self.add_class(class_identity).add_method(method)
    }

    /// The indexed class with this canonical identity, if any.
    pub fn class(&self, identity: &str) -> Option<&ClassEntry> {
        self.classes.iter().find(|c| c.identity == identity)
    }

    /// All indexed classes, in insertion order.
    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Merge another index into this one, class by class.
    pub fn extend(&mut self, other: DeclarationIndex) {
        for class in other.classes {
            let entry = self.add_class(class.identity);
            if class.comment.is_some() {
                entry.comment = class.comment;
            }
            if class.file.is_some() {
                entry.file = class.file;
                entry.line = class.line;
            }
            for method in class.methods {
                let slot = entry.add_method(method.name);
                if method.line.is_some() {
                    slot.line = method.line;
                }
                if method.comment.is_some() {
                    slot.comment = method.comment;
                }
            }
        }
    }
}

impl CommentSource for DeclarationIndex {
    fn resolve_class(&self, reference: &str) -> Result<String, ResolveError> {
        let wanted = normalize(reference);
        if wanted.is_empty() {
            return Err(ResolveError::UnknownClass(reference.to_string()));
        }
        if self.classes.iter().any(|c| c.identity == wanted) {
            return Ok(wanted);
        }
        // Short references resolve by unique suffix match.
        let suffix = format!(".{}", wanted);
        let mut matches = self.classes.iter().filter(|c| c.identity.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some(class), None) => Ok(class.identity.clone()),
            (Some(_), Some(_)) => Err(ResolveError::AmbiguousReference {
                reference: reference.to_string(),
                count: 2 + matches.count(),
            }),
            (None, _) => Err(ResolveError::UnknownClass(reference.to_string())),
        }
    }

    fn resolve_method(&self, class: &str, method: &str) -> Result<String, ResolveError> {
        let identity = self.resolve_class(class)?;
        let known = self
            .class(&identity)
            .is_some_and(|c| c.methods.iter().any(|m| m.name == method));
        if known {
            Ok(format!("{}#{}", identity, method))
        } else {
            Err(ResolveError::UnknownMethod(format!(
                "{}#{}",
                identity, method
            )))
        }
    }

    fn doc_comment(&self, identity: &str) -> Option<String> {
        match identity.split_once('#') {
            Some((class, method)) => self
                .class(class)?
                .methods
                .iter()
                .find(|m| m.name == method)?
                .comment
                .clone(),
            None => self.class(identity)?.comment.clone(),
        }
    }
}

impl ClassEntry {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Bare class name without its namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn methods(&self) -> &[MethodEntry] {
        &self.methods
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn set_location(&mut self, file: impl Into<PathBuf>, line: usize) -> &mut Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Add a method (or fetch it if already present).
    pub fn add_method(&mut self, name: impl Into<String>) -> &mut MethodEntry {
        let name = name.into();
        let pos = match self.methods.iter().position(|m| m.name == name) {
            Some(pos) => pos,
            None => {
                self.methods.push(MethodEntry {
                    name,
                    line: None,
                    comment: None,
                });
                self.methods.len() - 1
            }
        };
        &mut self.methods[pos]
    }
}

impl MethodEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn set_line(&mut self, line: usize) -> &mut Self {
        self.line = Some(line);
        self
    }
}
