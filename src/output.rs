//! Rendering of scan reports and query results for the CLI.

use crate::annotation::AnnotationMap;
use crate::error::Result;
use crate::index::DeclarationIndex;
use crate::scanner::ScanReport;
use colored::Colorize;
use serde::Serialize;

/// How CLI results are rendered.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable, colorized text.
    #[default]
    Text,
    /// Compact JSON.
    Json,
    /// Pretty-printed JSON.
    JsonPretty,
}

#[derive(Serialize)]
struct AnnotationsPayload<'a> {
    identity: &'a str,
    annotations: &'a AnnotationMap,
}

/// Serialize any payload as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Format a full scan report.
pub fn format_report(report: &ScanReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(report).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(report).unwrap_or_default(),
        OutputFormat::Text => format_report_text(report),
    }
}

fn format_report_text(report: &ScanReport) -> String {
    let mut output = String::new();

    for entry in &report.declarations {
        output.push_str(&format!(
            "{} {}",
            entry.identity.cyan().bold(),
            format!("[{}]", entry.kind).dimmed()
        ));
        if let (Some(file), Some(line)) = (&entry.file, entry.line) {
            output.push_str(&format!(
                " {}",
                format!("{}:{}", file.display(), line).dimmed()
            ));
        }
        output.push('\n');
        push_annotation_lines(&mut output, &entry.annotations);
    }

    output.push_str(&format!(
        "{}\n",
        format!("{} declarations", report.declarations.len()).bold()
    ));

    output
}

/// Format one declaration's annotation map.
pub fn format_annotations(
    identity: &str,
    annotations: &AnnotationMap,
    format: OutputFormat,
) -> String {
    let payload = AnnotationsPayload {
        identity,
        annotations,
    };
    match format {
        OutputFormat::Json => serde_json::to_string(&payload).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&payload).unwrap_or_default(),
        OutputFormat::Text => {
            let mut output = format!("{}\n", identity.cyan().bold());
            push_annotation_lines(&mut output, annotations);
            output
        }
    }
}

/// Format a single annotation value. `None` means the annotation is
/// absent on an otherwise valid declaration.
pub fn format_value(value: Option<&str>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::JsonPretty => {
            serde_json::to_string(&value).unwrap_or_default()
        }
        OutputFormat::Text => match value {
            Some(value) => value.to_string(),
            None => format!("{}", "(absent)".dimmed()),
        },
    }
}

/// Format every identity an index knows, classes and methods flattened.
pub fn format_identities(index: &DeclarationIndex, format: OutputFormat) -> String {
    let mut identities = Vec::new();
    for class in index.classes() {
        identities.push(class.identity().to_string());
        for method in class.methods() {
            identities.push(format!("{}#{}", class.identity(), method.name()));
        }
    }
    match format {
        OutputFormat::Json => serde_json::to_string(&identities).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&identities).unwrap_or_default(),
        OutputFormat::Text => {
            let mut output = String::new();
            for identity in &identities {
                match identity.split_once('#') {
                    Some((_, method)) => output.push_str(&format!("  #{}\n", method)),
                    None => output.push_str(&format!("{}\n", identity.bold())),
                }
            }
            output
        }
    }
}

fn push_annotation_lines(output: &mut String, annotations: &AnnotationMap) {
    if annotations.is_empty() {
        output.push_str(&format!("  {}\n", "(no annotations)".dimmed()));
        return;
    }
    for (name, value) in annotations.iter() {
        if value.is_empty() {
            output.push_str(&format!("  @{}\n", name.green()));
        } else {
            output.push_str(&format!("  @{} {}\n", name.green(), value));
        }
    }
}
