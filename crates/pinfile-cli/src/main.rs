mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::EXIT_FAILURE;
use pinfile_core::{Engine, Precedence, ProjectConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "pinfile",
    version,
    about = "Parse, check, and lock pinned requirements manifests"
)]
struct Cli {
    /// Path to a pinfile.toml (default: ./pinfile.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Which pin wins when a package is pinned twice: strict, first-wins, last-wins.
    #[arg(long, global = true)]
    precedence: Option<Precedence>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse a single manifest and list its entries and includes.
    Parse {
        /// Manifest file (default: root from config).
        manifest: Option<PathBuf>,
    },
    /// Rewrite a manifest in canonical form.
    Fmt {
        /// Manifest file (default: root from config).
        manifest: Option<PathBuf>,
        /// Exit non-zero if the manifest is not already formatted.
        #[arg(long, default_value_t = false, conflicts_with = "write")]
        check: bool,
        /// Write the result back instead of printing it.
        #[arg(long, default_value_t = false)]
        write: bool,
    },
    /// Follow every -c/-r include and print the flattened entries.
    Expand {
        /// Root manifest (default: root from config).
        root: Option<PathBuf>,
    },
    /// Check the flattened manifest for conflicting or duplicate pins.
    Check {
        /// Root manifest (default: root from config).
        root: Option<PathBuf>,
        /// Fail when a requirement ends up without any pinned version.
        #[arg(long, default_value_t = false)]
        deny_unpinned: bool,
    },
    /// Print the effective pin for every required package.
    Resolve {
        /// Root manifest (default: root from config).
        root: Option<PathBuf>,
    },
    /// Resolve and write a lock file.
    Lock {
        /// Root manifest (default: root from config).
        root: Option<PathBuf>,
        /// Lock file to write (default: lock_file from config).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Verify a lock file against the manifest it was generated from.
    Verify {
        /// Root manifest (default: root from config).
        root: Option<PathBuf>,
        /// Lock file to verify (default: lock_file from config).
        #[arg(long)]
        lock: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<ProjectConfig, String> {
    let config = match path {
        Some(p) => ProjectConfig::load(p),
        None => ProjectConfig::load_or_default(Path::new(".")),
    };
    config.map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PINFILE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    if let Some(precedence) = cli.precedence {
        config.precedence = precedence;
    }
    debug!("using config: {config:?}");

    let allow_unpinned = config.allow_unpinned;
    let engine = Engine::new(config);
    let json_output = cli.json;
    let root_or_default = |p: Option<PathBuf>| p.unwrap_or_else(|| engine.default_root().to_path_buf());

    let result = match cli.command {
        Commands::Parse { manifest } => {
            commands::parse::run(&engine, &root_or_default(manifest), json_output)
        }
        Commands::Fmt {
            manifest,
            check,
            write,
        } => commands::fmt::run(&engine, &root_or_default(manifest), check, write, json_output),
        Commands::Expand { root } => {
            commands::expand::run(&engine, &root_or_default(root), json_output)
        }
        Commands::Check {
            root,
            deny_unpinned,
        } => commands::check::run(
            &engine,
            &root_or_default(root),
            allow_unpinned && !deny_unpinned,
            json_output,
        ),
        Commands::Resolve { root } => {
            commands::resolve::run(&engine, &root_or_default(root), json_output)
        }
        Commands::Lock { root, output } => commands::lock::run(
            &engine,
            &root_or_default(root),
            output.as_deref(),
            json_output,
        ),
        Commands::Verify { root, lock } => commands::verify::run(
            &engine,
            &root_or_default(root),
            lock.as_deref(),
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {}", err.message);
            ExitCode::from(err.code)
        }
    }
}
