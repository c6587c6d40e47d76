//! rconv - report template converter
//!
//! Usage:
//!   rconv to-markdown <path>       - DOCX or RTF template to Markdown
//!   rconv to-docx <path>           - Markdown to DOCX
//!   rconv to-txt <path>            - Markdown or DOCX to plain text
//!   rconv txt-to-markdown <path>   - Plain text to Markdown
//!   rconv check <path>             - Report formatting problems without converting

mod config;

use clap::{Parser, Subcommand};
use config::Config;
use report_format::{ConversionError, Converter, LintWarning, Severity};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rconv")]
#[command(author, version, about = "Report template converter (DOCX, RTF, Markdown, plain text)")]
struct Cli {
    /// TOML file overriding the formatting rules
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a DOCX or legacy RTF template to Markdown
    ToMarkdown {
        /// Path to the input file
        path: PathBuf,
        /// Output path (defaults to the input with a .md extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert Markdown to DOCX
    ToDocx {
        path: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert Markdown or DOCX to plain text
    ToTxt {
        path: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert plain text to Markdown, re-inferring emphasis
    TxtToMarkdown {
        path: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a Markdown or DOCX template for formatting problems
    Check {
        path: PathBuf,
    },
}

/// Why a command could not finish.
#[derive(Debug)]
enum CommandError {
    Read(String),
    Write(String),
    Unsupported(String),
    Conversion(ConversionError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Read(e) => write!(f, "could not read file: {}", e),
            CommandError::Write(e) => write!(f, "could not write file: {}", e),
            CommandError::Unsupported(ext) => write!(f, "unsupported input type `{}`", ext),
            CommandError::Conversion(e) => write!(f, "{}", e),
        }
    }
}

impl From<ConversionError> for CommandError {
    fn from(e: ConversionError) -> Self {
        CommandError::Conversion(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Docx,
    Rtf,
    Markdown,
    Text,
}

impl InputKind {
    fn of(path: &Path) -> Result<Self, CommandError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "docx" => Ok(InputKind::Docx),
            "rtf" => Ok(InputKind::Rtf),
            "md" | "markdown" => Ok(InputKind::Markdown),
            "txt" => Ok(InputKind::Text),
            _ => Err(CommandError::Unsupported(ext)),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rconv=info,report_format=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(Config::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    let converter = Converter::new(config.format);

    match cli.command {
        Commands::ToMarkdown { path, output } => {
            convert_command(&path, || to_markdown(&converter, &path, output))
        }
        Commands::ToDocx { path, output } => {
            convert_command(&path, || to_docx(&converter, &path, output))
        }
        Commands::ToTxt { path, output } => {
            convert_command(&path, || to_txt(&converter, &path, output))
        }
        Commands::TxtToMarkdown { path, output } => {
            convert_command(&path, || txt_to_markdown(&converter, &path, output))
        }
        Commands::Check { path } => check_command(&converter, &path),
    }
}

fn convert_command(path: &Path, convert: impl FnOnce() -> Result<PathBuf, CommandError>) -> ExitCode {
    println!("  \x1b[1;32mConverting\x1b[0m {}", path.display());
    match convert() {
        Ok(output) => {
            println!("    \x1b[1;32mFinished\x1b[0m {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_command_error(&e, path);
            ExitCode::FAILURE
        }
    }
}

fn to_markdown(converter: &Converter, path: &Path, output: Option<PathBuf>) -> Result<PathBuf, CommandError> {
    let markup = match InputKind::of(path)? {
        InputKind::Docx => converter.rich_document_to_markup(&read_bytes(path)?)?,
        InputKind::Rtf => converter.legacy_to_markup(&read_bytes(path)?),
        other => return Err(CommandError::Unsupported(format!("{:?}", other).to_lowercase())),
    };
    write_output(output.unwrap_or_else(|| path.with_extension("md")), markup.as_bytes())
}

fn to_docx(converter: &Converter, path: &Path, output: Option<PathBuf>) -> Result<PathBuf, CommandError> {
    let markup = read_text(path)?;
    let bytes = converter.markup_to_rich_document(&markup)?;
    write_output(output.unwrap_or_else(|| path.with_extension("docx")), &bytes)
}

fn to_txt(converter: &Converter, path: &Path, output: Option<PathBuf>) -> Result<PathBuf, CommandError> {
    let markup = match InputKind::of(path)? {
        InputKind::Markdown => read_text(path)?,
        InputKind::Docx => converter.rich_document_to_markup(&read_bytes(path)?)?,
        other => return Err(CommandError::Unsupported(format!("{:?}", other).to_lowercase())),
    };
    let text = converter.markup_to_plain_text(&markup);
    write_output(output.unwrap_or_else(|| path.with_extension("txt")), text.as_bytes())
}

fn txt_to_markdown(converter: &Converter, path: &Path, output: Option<PathBuf>) -> Result<PathBuf, CommandError> {
    let text = read_text(path)?;
    let markup = converter.plain_text_to_markup(&text);
    write_output(output.unwrap_or_else(|| path.with_extension("md")), markup.as_bytes())
}

fn check_command(converter: &Converter, path: &Path) -> ExitCode {
    println!("    \x1b[1;32mChecking\x1b[0m {}", path.display());

    let warnings = match run_check(converter, path) {
        Ok(w) => w,
        Err(e) => {
            print_command_error(&e, path);
            return ExitCode::FAILURE;
        }
    };

    print_warnings(&warnings, path);
    let error_count = count_errors(&warnings);
    print_summary(error_count, warnings.len() - error_count, error_count > 0);

    if error_count > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_check(converter: &Converter, path: &Path) -> Result<Vec<LintWarning>, CommandError> {
    match InputKind::of(path)? {
        InputKind::Markdown => Ok(converter.check_markup(&read_text(path)?)),
        InputKind::Docx => Ok(converter.check_rich_document(&read_bytes(path)?)?),
        other => Err(CommandError::Unsupported(format!("{:?}", other).to_lowercase())),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CommandError> {
    fs::read(path).map_err(|e| CommandError::Read(e.to_string()))
}

/// Text files are UTF-8 or, for older templates, Windows-1252.
fn read_text(path: &Path) -> Result<String, CommandError> {
    let bytes = read_bytes(path)?;
    Ok(report_format::legacy::decode(&bytes).into_owned())
}

fn write_output(path: PathBuf, contents: &[u8]) -> Result<PathBuf, CommandError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CommandError::Write(e.to_string()))?;
    }
    fs::write(&path, contents).map_err(|e| CommandError::Write(e.to_string()))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(path)
}

fn count_errors(warnings: &[LintWarning]) -> usize {
    warnings.iter().filter(|w| w.severity == Severity::Error).count()
}

fn print_warnings(warnings: &[LintWarning], path: &Path) {
    for w in warnings {
        let (color, label) = match w.severity {
            Severity::Error => ("\x1b[1;31m", "error"),
            Severity::Warning => ("\x1b[1;33m", "warning"),
            Severity::Info => ("\x1b[1;36m", "info"),
        };

        println!("{}{}\x1b[0m: {}", color, label, w.message);
        match w.column {
            Some(column) => println!("  \x1b[1;34m-->\x1b[0m {}:{}:{}", path.display(), w.line, column + 1),
            None => println!("  \x1b[1;34m-->\x1b[0m {}:{}", path.display(), w.line),
        }
        println!();
    }
}

fn print_summary(errors: usize, warnings: usize, is_error: bool) {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    if is_error {
        print!("\x1b[1;31merror\x1b[0m: ");
        println!(
            "aborting due to {} error{}{}",
            errors,
            plural(errors),
            if warnings > 0 {
                format!("; {} warning{} emitted", warnings, plural(warnings))
            } else {
                String::new()
            }
        );
    } else if warnings > 0 {
        println!("\x1b[1;33mwarning\x1b[0m: {} warning{} emitted", warnings, plural(warnings));
    }
}

fn print_error(msg: &str) {
    println!("\x1b[1;31merror\x1b[0m: {}", msg);
}

fn print_command_error(e: &CommandError, path: &Path) {
    println!("\x1b[1;31merror\x1b[0m: {}", e);
    println!("  \x1b[1;34m-->\x1b[0m {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_input_kind() {
        assert_eq!(InputKind::of(Path::new("a/laudo.DOCX")).unwrap(), InputKind::Docx);
        assert_eq!(InputKind::of(Path::new("laudo.md")).unwrap(), InputKind::Markdown);
        assert!(matches!(InputKind::of(Path::new("laudo.pdf")), Err(CommandError::Unsupported(e)) if e == "pdf"));
    }

    #[test]
    fn test_markdown_docx_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::default();
        let md = write(dir.path(), "laudo.md", "# Técnica\nCorpo do laudo.\nFim.".as_bytes());

        let docx = to_docx(&converter, &md, None).unwrap();
        assert_eq!(docx, dir.path().join("laudo.docx"));

        let back = to_markdown(&converter, &docx, Some(dir.path().join("out/back.md"))).unwrap();
        assert_eq!(
            fs::read_to_string(back).unwrap(),
            "# **Técnica**\nCorpo do laudo.\n*Fim.*"
        );
    }

    #[test]
    fn test_txt_round() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::default();
        let txt = write(dir.path(), "laudo.txt", b"Findings: clear.\nImpression: normal.\n");

        let md = txt_to_markdown(&converter, &txt, None).unwrap();
        assert_eq!(
            fs::read_to_string(&md).unwrap(),
            "**Findings: clear.**\n*Impression: normal.*\n"
        );

        let plain = to_txt(&converter, &md, Some(dir.path().join("plain.txt"))).unwrap();
        assert_eq!(
            fs::read_to_string(plain).unwrap(),
            "Findings: clear.\nImpression: normal.\n"
        );
    }

    #[test]
    fn test_windows_1252_text_input() {
        let dir = tempfile::tempdir().unwrap();
        let txt = write(dir.path(), "antigo.txt", &[b'I', b'm', b'p', b'r', b'e', b's', b's', 0xe3, b'o', b':']);
        let md = txt_to_markdown(&Converter::default(), &txt, None).unwrap();
        assert_eq!(fs::read_to_string(md).unwrap(), "*Impressão:*");
    }

    #[test]
    fn test_rtf_to_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let rtf = write(dir.path(), "velho.rtf", br"{\rtf1\ansi{\fonttbl{\f0 Arial;}}\f0 Impress\'e3o:\par Normal.\par}");
        let md = to_markdown(&Converter::default(), &rtf, None).unwrap();
        assert_eq!(fs::read_to_string(md).unwrap(), "**Impressão:**\nNormal.");
    }

    #[test]
    fn test_check_reports_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let md = write(dir.path(), "laudo.md", b"Top\n**open\nEnd");
        let warnings = run_check(&Converter::default(), &md).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 2);
        assert_eq!(count_errors(&warnings), 0);
    }

    #[test]
    fn test_check_fails_on_empty_template() {
        let dir = tempfile::tempdir().unwrap();
        let md = write(dir.path(), "vazio.md", b"\n\n");
        let warnings = run_check(&Converter::default(), &md).unwrap();
        assert_eq!(count_errors(&warnings), 1);

        let docx = to_docx(&Converter::default(), &md, None).unwrap();
        let warnings = run_check(&Converter::default(), &docx).unwrap();
        assert_eq!(count_errors(&warnings), 1);
    }

    #[test]
    fn test_unreadable_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.md");
        assert!(matches!(
            to_docx(&Converter::default(), &missing, None),
            Err(CommandError::Read(_))
        ));
    }
}
