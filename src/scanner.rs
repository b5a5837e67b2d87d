//! Source tree scanning: extracts `/** ... */` doc blocks and the class
//! and method declarations they document into a [`DeclarationIndex`].
//!
//! The scan is a line-oriented pass per file. A captured doc block
//! attaches to the next class or method declaration that starts within
//! `comment_gap` lines of the block's closing line. Methods attach to the
//! most recently declared class while its brace scope is open; functions
//! outside any class scope are ignored.

use crate::annotation::{AnnotationMap, DeclKind};
use crate::error::{Error, Result};
use crate::index::DeclarationIndex;
use crate::language::Language;
use crate::parser;
use serde::Serialize;
use std::mem;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scan configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Restrict the scan to these languages; `None` scans all of them.
    pub languages: Option<Vec<Language>>,
    /// How many lines a declaration may sit below a doc block's closing
    /// line and still claim it.
    pub comment_gap: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            languages: None,
            comment_gap: 2,
        }
    }
}

impl ScanOptions {
    fn wants(&self, language: Language) -> bool {
        self.languages
            .as_ref()
            .map_or(true, |langs| langs.contains(&language))
    }
}

/// Scan one source file into the index.
///
/// Unsupported extensions are an error here; a file whose language the
/// options exclude is silently left alone.
pub fn scan_file(path: &Path, options: &ScanOptions, index: &mut DeclarationIndex) -> Result<()> {
    let language = Language::from_path(path)
        .ok_or_else(|| Error::UnsupportedFileType(path.display().to_string()))?;
    if !options.wants(language) {
        tracing::debug!("skipping {} (language filtered out)", path.display());
        return Ok(());
    }
    let content = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    scan_content(language, path, &content, options, index);
    tracing::debug!("scanned {} as {}", path.display(), language);
    Ok(())
}

/// Walk a directory tree and scan every supported file.
///
/// Unsupported files are skipped; unreadable files and walk errors are
/// logged and skipped so one bad file cannot abort the scan. Returns the
/// number of files scanned.
pub fn scan_directory(
    dir: &Path,
    options: &ScanOptions,
    index: &mut DeclarationIndex,
) -> Result<usize> {
    let mut scanned = 0;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let language = match Language::from_path(path) {
            Some(language) => language,
            None => continue,
        };
        if !options.wants(language) {
            continue;
        }
        match scan_file(path, options, index) {
            Ok(()) => scanned += 1,
            Err(err) => tracing::warn!("skipping {}: {}", path.display(), err),
        }
    }
    Ok(scanned)
}

/// Scan a file or a directory tree, returning the number of files read.
pub fn scan_path(
    path: &Path,
    options: &ScanOptions,
    index: &mut DeclarationIndex,
) -> Result<usize> {
    if std::fs::metadata(path)?.is_dir() {
        scan_directory(path, options, index)
    } else {
        scan_file(path, options, index)?;
        Ok(1)
    }
}

struct PendingComment {
    text: String,
    end_line: usize,
}

/// Take the pending block if `line` is close enough to claim it. A
/// declaration past the gap drops the stale block either way.
fn take_pending(pending: &mut Option<PendingComment>, line: usize, gap: usize) -> Option<String> {
    match pending.take() {
        Some(comment) if line.saturating_sub(comment.end_line) <= gap => Some(comment.text),
        _ => None,
    }
}

fn scan_content(
    language: Language,
    path: &Path,
    content: &str,
    options: &ScanOptions,
    index: &mut DeclarationIndex,
) {
    let namespace_re = language.namespace_pattern();
    let class_re = language.class_pattern();
    let method_re = language.method_pattern();

    let mut namespace: Option<String> = None;
    let mut current_class: Option<String> = None;
    let mut pending: Option<PendingComment> = None;
    let mut block_buf = String::new();
    let mut in_block = false;
    // Brace nesting outside doc blocks. A class claims methods only while
    // its body scope is open.
    let mut depth = 0usize;
    let mut class_depth = 0usize;
    let mut in_class_body = false;

    for (offset, line) in content.lines().enumerate() {
        let line_number = offset + 1;

        if in_block {
            block_buf.push('\n');
            block_buf.push_str(line);
            if line.contains("*/") {
                in_block = false;
                pending = Some(PendingComment {
                    text: mem::take(&mut block_buf),
                    end_line: line_number,
                });
            }
            continue;
        }

        if let Some(start) = line.find("/**") {
            let rest = &line[start..];
            match rest.find("*/") {
                Some(end) => {
                    pending = Some(PendingComment {
                        text: rest[..end + 2].to_string(),
                        end_line: line_number,
                    });
                }
                None => {
                    block_buf = rest.to_string();
                    in_block = true;
                }
            }
            continue;
        }

        let namespace_cap = namespace_re
            .as_ref()
            .and_then(|re| re.captures(line))
            .and_then(|c| c.get(1));
        if let Some(cap) = namespace_cap {
            namespace = Some(cap.as_str().to_string());
        } else if let Some(cap) = class_re.captures(line).and_then(|c| c.get(1)) {
            let raw = match &namespace {
                Some(ns) => format!("{}.{}", ns, cap.as_str()),
                None => cap.as_str().to_string(),
            };
            let comment = take_pending(&mut pending, line_number, options.comment_gap);
            let entry = index.add_class(raw);
            entry.set_location(path, line_number);
            if let Some(comment) = comment {
                entry.set_comment(comment);
            }
            current_class = Some(entry.identity().to_string());
            class_depth = depth;
            in_class_body = false;
        } else if let Some(cap) = method_re.captures(line).and_then(|c| c.get(1)) {
            let name = cap.as_str();
            if !language.is_reserved(name) {
                let comment = take_pending(&mut pending, line_number, options.comment_gap);
                match &current_class {
                    Some(class) => {
                        let entry = index.add_method(class, name);
                        entry.set_line(line_number);
                        if let Some(comment) = comment {
                            entry.set_comment(comment);
                        }
                    }
                    // Free function: not a method, and its doc block
                    // (already taken above) must not leak to a later
                    // declaration.
                    None => {}
                }
            }
        }

        let opens = line.matches('{').count();
        let closes = line.matches('}').count();
        if current_class.is_some() && !in_class_body && depth + opens > class_depth {
            in_class_body = true;
        }
        depth = (depth + opens).saturating_sub(closes);
        if in_class_body && depth <= class_depth {
            current_class = None;
            in_class_body = false;
        }
    }
}

/// Serializable listing of everything a scan found, annotations parsed.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub declarations: Vec<ReportEntry>,
}

/// One class or method row of a [`ScanReport`].
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub identity: String,
    pub kind: DeclKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub annotations: AnnotationMap,
}

impl ScanReport {
    /// Flatten an index into report rows, each class followed by its
    /// methods, in index order.
    pub fn build(index: &DeclarationIndex) -> Self {
        let mut declarations = Vec::new();
        for class in index.classes() {
            declarations.push(ReportEntry {
                identity: class.identity().to_string(),
                kind: DeclKind::Class,
                file: class.file().map(Path::to_path_buf),
                line: class.line(),
                annotations: parser::parse_comment(class.comment().unwrap_or_default()),
            });
            for method in class.methods() {
                declarations.push(ReportEntry {
                    identity: format!("{}#{}", class.identity(), method.name()),
                    kind: DeclKind::Method,
                    file: class.file().map(Path::to_path_buf),
                    line: method.line(),
                    annotations: parser::parse_comment(method.comment().unwrap_or_default()),
                });
            }
        }
        Self { declarations }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::index::CommentSource;
    use crate::reader::AnnotationReader;

    const PHP_DEMO: &str = "<?php\n\
                            namespace Neo\\Annotations;\n\
                            \n\
                            /**\n\
                            \x20* @package Neo.Annotations\n\
                            \x20*/\n\
                            class Demo\n\
                            {\n\
                            \x20   /**\n\
                            \x20    * @Authentication required\n\
                            \x20    * over multiline\n\
                            \x20    */\n\
                            \x20   public function login($user)\n\
                            \x20   {\n\
                            \x20   }\n\
                            \n\
                            \x20   public function logout()\n\
                            \x20   {\n\
                            \x20   }\n\
                            }\n";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_scan_php_file_populates_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "Demo.php", PHP_DEMO);

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();

        assert_eq!(index.len(), 1);
        let class = index.class("Neo.Annotations.Demo").unwrap();
        assert_eq!(class.name(), "Demo");
        assert_eq!(class.line(), Some(7));
        assert_eq!(class.file(), Some(path.as_path()));
        assert!(class.comment().unwrap().contains("@package"));

        let methods: Vec<_> = class.methods().iter().map(|m| m.name()).collect();
        assert_eq!(methods, vec!["login", "logout"]);
        assert!(class.methods()[0].comment().unwrap().contains("@Authentication"));
        assert!(class.methods()[1].comment().is_none());
    }

    #[test]
    fn test_scanned_index_feeds_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "Demo.php", PHP_DEMO);

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();

        let reader = AnnotationReader::new(index);
        assert_eq!(
            reader.annotation_for_class("Demo", "package").unwrap(),
            Some("Neo.Annotations".to_string())
        );
        assert_eq!(
            reader
                .annotation_for_method(("Demo", "login"), "Authentication")
                .unwrap(),
            Some("required over multiline".to_string())
        );
    }

    #[test]
    fn test_scan_directory_skips_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Demo.php", PHP_DEMO);
        write_file(dir.path(), "notes.txt", "/** @ignored */\nclass NotCode {}");
        write_file(
            dir.path(),
            "session.ts",
            "/** @since 2.0 */\nexport class Session {\n  login(user: string): void {\n  }\n}\n",
        );

        let mut index = DeclarationIndex::new();
        let scanned = scan_directory(dir.path(), &ScanOptions::default(), &mut index).unwrap();

        assert_eq!(scanned, 2);
        assert!(index.class("Neo.Annotations.Demo").is_some());
        assert!(index.class("Session").is_some());
        assert!(index.class("NotCode").is_none());
    }

    #[test]
    fn test_language_filter_limits_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Demo.php", PHP_DEMO);
        write_file(dir.path(), "session.ts", "export class Session {\n}\n");

        let options = ScanOptions {
            languages: Some(vec![Language::Php]),
            ..ScanOptions::default()
        };
        let mut index = DeclarationIndex::new();
        let scanned = scan_directory(dir.path(), &options, &mut index).unwrap();

        assert_eq!(scanned, 1);
        assert!(index.class("Session").is_none());
    }

    #[test]
    fn test_single_line_block_attaches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "One.php",
            "<?php\n/** @since 1.2 */\nclass One {}\n",
        );

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();

        let class = index.class("One").unwrap();
        assert_eq!(class.comment(), Some("/** @since 1.2 */"));
    }

    #[test]
    fn test_block_past_the_gap_does_not_attach() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "Far.php",
            "<?php\n/**\n * @orphaned yes\n */\n\n\n\nclass Far {}\n",
        );

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();

        assert!(index.class("Far").unwrap().comment().is_none());
    }

    #[test]
    fn test_top_level_functions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "free.php",
            "<?php\n/** @helper yes */\nfunction helper() {\n}\n\nclass Late {}\n",
        );

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();

        let class = index.class("Late").unwrap();
        assert!(class.methods().is_empty());
        // The free function consumed its block; nothing leaks to Late.
        assert!(class.comment().is_none());
    }

    #[test]
    fn test_function_after_class_body_is_not_a_method() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "After.php",
            "<?php\nclass A\n{\n    function m()\n    {\n    }\n}\nfunction helper()\n{\n}\n",
        );

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();

        let class = index.class("A").unwrap();
        let methods: Vec<_> = class.methods().iter().map(|m| m.name()).collect();
        assert_eq!(methods, vec!["m"]);
        assert!(matches!(
            index.resolve_method("A", "helper").unwrap_err(),
            ResolveError::UnknownMethod(_)
        ));
    }

    #[test]
    fn test_unsupported_file_is_an_error_when_named_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "notes.txt", "nothing");

        let mut index = DeclarationIndex::new();
        let err = scan_file(&path, &ScanOptions::default(), &mut index).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn test_report_rows_parse_annotations() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "Demo.php", PHP_DEMO);

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();
        let report = ScanReport::build(&index);

        assert_eq!(report.declarations.len(), 3);
        assert_eq!(report.declarations[0].identity, "Neo.Annotations.Demo");
        assert_eq!(report.declarations[0].kind, DeclKind::Class);
        assert_eq!(
            report.declarations[0].annotations.get("package"),
            Some("Neo.Annotations")
        );
        assert_eq!(
            report.declarations[1].identity,
            "Neo.Annotations.Demo#login"
        );
        assert_eq!(report.declarations[1].line, Some(13));
        assert!(report.declarations[2].annotations.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["declarations"][0]["annotations"]["package"],
            "Neo.Annotations"
        );
        assert_eq!(json["declarations"][1]["kind"], "method");
    }

    #[test]
    fn test_scan_path_dispatches_on_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "Demo.php", PHP_DEMO);

        let mut from_file = DeclarationIndex::new();
        assert_eq!(
            scan_path(&file, &ScanOptions::default(), &mut from_file).unwrap(),
            1
        );
        let mut from_dir = DeclarationIndex::new();
        assert_eq!(
            scan_path(dir.path(), &ScanOptions::default(), &mut from_dir).unwrap(),
            1
        );
        assert_eq!(from_file.len(), from_dir.len());
    }

    #[test]
    fn test_methods_without_class_comment_still_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "Bare.php",
            "<?php\nclass Bare {\n    public function run() {\n    }\n}\n",
        );

        let mut index = DeclarationIndex::new();
        scan_file(&path, &ScanOptions::default(), &mut index).unwrap();

        assert!(index.doc_comment("Bare").is_none());
        assert!(index.doc_comment("Bare#run").is_none());
        assert_eq!(index.resolve_method("Bare", "run").unwrap(), "Bare#run");
    }
}
