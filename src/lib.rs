//! Extracts `@name value` annotations from `/** ... */` documentation
//! comments attached to class and method declarations, and serves them
//! through a cached query API.
//!
//! A [`DeclarationIndex`] holds declarations and their raw doc blocks,
//! populated programmatically or by [`scan_path`] over a source tree. An
//! [`AnnotationReader`] resolves class and method references against it,
//! parses each doc block once, and memoizes the resulting
//! [`AnnotationMap`] per declaration.
//!
//! ```
//! use doctag_core::{AnnotationReader, DeclarationIndex};
//!
//! let mut index = DeclarationIndex::new();
//! index
//!     .add_class("app.Greeter")
//!     .set_comment("/**\n * @package app\n */")
//!     .add_method("greet")
//!     .set_comment("/**\n * @Authentication none\n */");
//!
//! let reader = AnnotationReader::new(index);
//!
//! let map = reader.annotations_for_class("Greeter").unwrap();
//! assert_eq!(map.get("package"), Some("app"));
//!
//! let auth = reader
//!     .annotation_for_method(("Greeter", "greet"), "Authentication")
//!     .unwrap();
//! assert_eq!(auth.as_deref(), Some("none"));
//! ```

pub mod annotation;
pub mod cache;
pub mod error;
pub mod index;
pub mod language;
pub mod output;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod scanner;

pub use annotation::{AnnotationMap, DeclKind, MethodRef};
pub use cache::AnnotationCache;
pub use error::{Error, ResolveError, Result, ServiceError};
pub use index::{ClassEntry, CommentSource, DeclarationIndex, MethodEntry};
pub use language::Language;
pub use output::{
    format_annotations, format_identities, format_report, format_value, to_json, OutputFormat,
};
pub use parser::parse_comment;
pub use reader::AnnotationReader;
pub use registry::ServiceRegistry;
pub use scanner::{scan_directory, scan_file, scan_path, ReportEntry, ScanOptions, ScanReport};
