use std::ffi::OsString;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, ExitCode};

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use dotsource::{DEFAULT_COMMENT, DEFAULT_EXPORT, DEFAULT_QUOTE, Entry, Sourcer, VisitFn, quote};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILE: &str = ".env";

/// Parse dotenv files line by line and source them.
#[derive(Debug, Parser)]
#[command(name = "dotsource", version)]
struct Cli {
    /// Print loader diagnostics to stderr. Repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress loader diagnostics.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Print every definition as `NAME="value"`, in file order.
    Parse {
        #[command(flatten)]
        tokens: TokenArgs,

        /// Dotenv files to read. Defaults to .env.
        #[arg(value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Load dotenv files and execute a command with the definitions set.
    Run {
        #[command(flatten)]
        tokens: TokenArgs,

        /// Dotenv file path(s). Repeat or pass comma-separated paths.
        #[arg(short, long = "file", value_name = "PATHS", value_delimiter = ',')]
        files: Vec<PathBuf>,

        /// Command to execute, followed by its arguments.
        #[arg(
            value_name = "COMMAND",
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<OsString>,
    },
}

/// Token overrides. An empty value disables the feature.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
struct TokenArgs {
    /// Comment token.
    #[arg(long, value_name = "TOKEN", default_value = DEFAULT_COMMENT)]
    comment: String,

    /// Quote token.
    #[arg(long, value_name = "TOKEN", default_value = DEFAULT_QUOTE)]
    quote: String,

    /// Export keyword.
    #[arg(long, value_name = "TOKEN", default_value = DEFAULT_EXPORT)]
    export: String,
}

impl TokenArgs {
    fn sourcer(&self) -> Sourcer {
        Sourcer::new()
            .comment(&self.comment)
            .quote(&self.quote)
            .export(&self.export)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("dotsource: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: CliCommand) -> anyhow::Result<ExitCode> {
    match command {
        CliCommand::Parse { tokens, files } => {
            print_definitions(&tokens.sourcer(), &default_files(files))?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Run {
            tokens,
            files,
            command,
        } => {
            let entries = load_entries(&tokens.sourcer(), &default_files(files))?;
            execute(entries, command)
        }
    }
}

fn default_files(files: Vec<PathBuf>) -> Vec<PathBuf> {
    if files.is_empty() {
        vec![PathBuf::from(DEFAULT_FILE)]
    } else {
        files
    }
}

fn print_definitions(sourcer: &Sourcer, files: &[PathBuf]) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for path in files {
        let mut printer =
            VisitFn(|name: &str, value: &str| writeln!(out, "{name}={}", quote(value)));
        sourcer
            .drive_file(path, &mut printer)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
    }
    out.flush()?;
    Ok(())
}

fn load_entries(sourcer: &Sourcer, files: &[PathBuf]) -> anyhow::Result<Vec<Entry>> {
    let mut entries: Vec<Entry> = Vec::new();
    for path in files {
        sourcer
            .drive_file(path, &mut entries)
            .with_context(|| format!("failed to load `{}`", path.display()))?;
        info!(path = %path.display(), total = entries.len(), "loaded dotenv file");
    }
    Ok(entries)
}

fn execute(entries: Vec<Entry>, command: Vec<OsString>) -> anyhow::Result<ExitCode> {
    let Some((program, args)) = command.split_first() else {
        bail!("missing command after `run`");
    };

    let mut child = Command::new(program);
    child.args(args);
    for entry in entries {
        child.env(entry.name, entry.value);
    }

    spawn(child, program)
}

#[cfg(unix)]
fn spawn(mut command: Command, program: &OsString) -> anyhow::Result<ExitCode> {
    let err = command.exec();
    Err(err).with_context(|| format!("failed to execute `{}`", program.to_string_lossy()))
}

#[cfg(not(unix))]
fn spawn(mut command: Command, program: &OsString) -> anyhow::Result<ExitCode> {
    let status = command
        .status()
        .with_context(|| format!("failed to execute `{}`", program.to_string_lossy()))?;
    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
