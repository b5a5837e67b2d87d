use clap::{Parser, Subcommand, ValueEnum};
use doctag_core::{
    output, scanner, AnnotationMap, AnnotationReader, CommentSource, DeclarationIndex, Language,
    MethodRef, OutputFormat, ResolveError, ScanOptions, ScanReport,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "doctag")]
#[command(author, version, about = "Extract @name annotations from doc comments in source trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan sources and print every declaration with its annotations
    Scan {
        /// Path to file or directory to scan
        path: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        /// Only scan these languages (repeatable; default: all)
        #[arg(long, short, value_enum)]
        language: Vec<LanguageArg>,

        /// Lines a declaration may sit below its doc block
        #[arg(long, default_value = "2")]
        comment_gap: usize,
    },

    /// Look up the annotations on one class or method
    Get {
        /// Path to file or directory to scan
        path: PathBuf,

        /// Class (`app.Foo`) or method (`app.Foo::bar`) reference
        reference: String,

        /// Read a single annotation instead of the whole map
        #[arg(long, short)]
        name: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        /// Only scan these languages (repeatable; default: all)
        #[arg(long, short, value_enum)]
        language: Vec<LanguageArg>,

        /// Lines a declaration may sit below its doc block
        #[arg(long, default_value = "2")]
        comment_gap: usize,
    },

    /// List every declaration identity found under a path
    List {
        /// Path to file or directory to scan
        path: PathBuf,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,

        /// Only scan these languages (repeatable; default: all)
        #[arg(long, short, value_enum)]
        language: Vec<LanguageArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lower")]
enum LanguageArg {
    Php,
    Java,
    TypeScript,
    JavaScript,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Php => Language::Php,
            LanguageArg::Java => Language::Java,
            LanguageArg::TypeScript => Language::TypeScript,
            LanguageArg::JavaScript => Language::JavaScript,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            path,
            format,
            language,
            comment_gap,
        } => {
            let options = ScanOptions {
                languages: to_languages(&language),
                comment_gap,
            };
            let mut index = DeclarationIndex::new();
            match scanner::scan_path(&path, &options, &mut index) {
                Ok(scanned) => {
                    tracing::debug!("scanned {} files under {}", scanned, path.display());
                    let report = ScanReport::build(&index);
                    println!("{}", output::format_report(&report, format.into()));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(2)
                }
            }
        }

        Commands::Get {
            path,
            reference,
            name,
            format,
            language,
            comment_gap,
        } => {
            let options = ScanOptions {
                languages: to_languages(&language),
                comment_gap,
            };
            let mut index = DeclarationIndex::new();
            if let Err(e) = scanner::scan_path(&path, &options, &mut index) {
                eprintln!("Error: {}", e);
                return ExitCode::from(2);
            }

            let reader = AnnotationReader::new(index);
            match lookup(&reader, &reference) {
                Ok((identity, annotations)) => match name {
                    None => {
                        println!(
                            "{}",
                            output::format_annotations(&identity, &annotations, format.into())
                        );
                        ExitCode::SUCCESS
                    }
                    Some(name) => {
                        let value = annotations.get(&name);
                        println!("{}", output::format_value(value, format.into()));
                        if value.is_none() {
                            ExitCode::from(1)
                        } else {
                            ExitCode::SUCCESS
                        }
                    }
                },
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(1)
                }
            }
        }

        Commands::List {
            path,
            format,
            language,
        } => {
            let options = ScanOptions {
                languages: to_languages(&language),
                ..ScanOptions::default()
            };
            let mut index = DeclarationIndex::new();
            match scanner::scan_path(&path, &options, &mut index) {
                Ok(_) => {
                    println!("{}", output::format_identities(&index, format.into()));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(2)
                }
            }
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("doctag_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn to_languages(args: &[LanguageArg]) -> Option<Vec<Language>> {
    if args.is_empty() {
        None
    } else {
        Some(args.iter().map(|arg| Language::from(*arg)).collect())
    }
}

/// Resolve a reference and fetch its annotations. References with a
/// method separator query the method; the rest query the class.
fn lookup<S: CommentSource>(
    reader: &AnnotationReader<S>,
    reference: &str,
) -> Result<(String, Arc<AnnotationMap>), ResolveError> {
    if reference.contains("::") || reference.contains('#') {
        let (class, method) = MethodRef::from(reference).split()?;
        let identity = reader.source().resolve_method(class, method)?;
        let annotations = reader.annotations_for_method(identity.as_str())?;
        Ok((identity, annotations))
    } else {
        let identity = reader.source().resolve_class(reference)?;
        let annotations = reader.annotations_for_class(&identity)?;
        Ok((identity, annotations))
    }
}
