use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use drift_patcher::engine::{EditEngine, EditRequest};
use drift_patcher::fsio::DiskFiles;
use drift_patcher::symbol::{ExtractionError, RawSymbol, SymbolExtractor};
use drift_patcher::{lineref, WorkspaceGate};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "drift-patcher")]
#[command(about = "Drift-tolerant text patching for AI coding agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one edit to a file
    Apply {
        /// File to edit, relative to the workspace root
        #[arg(short, long)]
        file: String,

        /// Workspace root (defaults to DRIFT_WORKSPACE, then the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Literal text to replace (text-match addressing)
        #[arg(long)]
        old: Option<String>,

        /// Named symbol to target (requires a structural-extraction service)
        #[arg(long)]
        symbol: Option<String>,

        /// Start line reference, e.g. '42' or '42:ab'
        #[arg(long)]
        start_line: Option<String>,

        /// End line reference (defaults to start_line)
        #[arg(long)]
        end_line: Option<String>,

        /// Insert relative to the target instead of replacing: 'before' or 'after'
        #[arg(long)]
        position: Option<String>,

        /// Replace every occurrence of the matched text
        #[arg(long)]
        replace_all: bool,

        /// Replacement text (empty text deletes the targeted lines)
        #[arg(long, default_value = "")]
        new: String,

        /// Show a unified diff of the change
        #[arg(short, long)]
        diff: bool,
    },

    /// Print a file in the observation format the engine's checksums refer to
    View {
        /// File to print, relative to the workspace root
        #[arg(short, long)]
        file: String,

        /// Workspace root (defaults to DRIFT_WORKSPACE, then the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// First line to print (1-indexed)
        #[arg(long, default_value_t = 1)]
        from: usize,

        /// Last line to print (defaults to end of file)
        #[arg(long)]
        to: Option<usize>,
    },
}

/// The CLI runs without a structural-extraction service; symbol addressing
/// reports how to get one instead of failing opaquely.
struct NoExtractionService;

impl SymbolExtractor for NoExtractionService {
    fn extract(&self, _path: &Path, _symbol: &str) -> Result<Option<RawSymbol>, ExtractionError> {
        Err(ExtractionError(
            "no structural-extraction service is configured; use --old or --start-line \
             addressing, or embed the engine with an extractor"
                .to_string(),
        ))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            file,
            workspace,
            old,
            symbol,
            start_line,
            end_line,
            position,
            replace_all,
            new,
            diff,
        } => cmd_apply(
            file,
            workspace,
            EditRequest {
                file_path: String::new(),
                new_text: new,
                old_text: old,
                symbol,
                position,
                replace_all,
                start_line,
                end_line,
            },
            diff,
        ),

        Commands::View {
            file,
            workspace,
            from,
            to,
        } => cmd_view(file, workspace, from, to),
    }
}

/// Resolve the workspace root: explicit flag, then DRIFT_WORKSPACE, then
/// the current directory.
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return path
            .canonicalize()
            .with_context(|| format!("workspace does not exist: {}", path.display()));
    }

    if let Ok(env_path) = env::var("DRIFT_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!("Warning: DRIFT_WORKSPACE is set but path doesn't exist: {env_path}").yellow()
        );
    }

    Ok(env::current_dir()?)
}

fn cmd_apply(
    file: String,
    workspace: Option<PathBuf>,
    mut request: EditRequest,
    show_diff: bool,
) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let gate = WorkspaceGate::new(&workspace)?;

    let path = workspace.join(&file);
    request.file_path = path.display().to_string();

    // The operator invoking the CLI is the observer; reading the file here
    // is what satisfies the read-before-edit gate.
    let before = fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    gate.mark_read(&path);

    let files = DiskFiles;
    let extractor = NoExtractionService;
    let engine = EditEngine::new(&files, &extractor, &gate);

    let outcome = engine.apply(&request);

    if outcome.success {
        println!("{}", outcome.message.green());
        if show_diff {
            let after = fs::read_to_string(&path)?;
            println!();
            print_diff(&before, &after);
        }
        Ok(())
    } else {
        println!("{}", outcome.message.red());
        std::process::exit(1);
    }
}

fn cmd_view(file: String, workspace: Option<PathBuf>, from: usize, to: Option<usize>) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let path = workspace.join(&file);

    let content = fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let content = content.replace("\r\n", "\n");
    let lines: Vec<&str> = content.lines().collect();

    if from == 0 || from > lines.len() {
        anyhow::bail!("--from {} is out of range; the file has {} lines", from, lines.len());
    }
    let to = to.unwrap_or(lines.len()).min(lines.len());

    for (offset, line) in lines[from - 1..to].iter().enumerate() {
        let number = from + offset;
        println!("{number}:{} | {line}", lineref::checksum(line));
    }

    Ok(())
}

/// Unified diff of the applied change.
fn print_diff(original: &str, modified: &str) {
    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{sign}");
    }
}
