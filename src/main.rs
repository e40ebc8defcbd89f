//! # SMCA CLI (`smca`)
//!
//! ## Usage
//!
//! ```bash
//! smca --config ./config/smca.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `smca serve` | Start the upload + SSE analysis server |
//! | `smca analyze <file>` | Analyze one local file and print the JSON report |
//! | `smca completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! smca serve --config ./config/smca.toml
//! smca analyze post.docx --pretty
//! smca analyze scan.png --progress json 2>progress.log > report.json
//! ```

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use smca::config::{load_config, load_config_or_default};
use smca::progress::ProgressMode;
use smca::{analyze_cmd, logging, server};

/// Social media content analyzer.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/smca.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "smca",
    about = "Social media content analyzer: text extraction and a streaming NLP analysis pipeline",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// `serve` requires it; `analyze` falls back to built-in defaults when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/smca.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// `POST /upload` accepts a file and returns a task id;
    /// `GET /analyze_stream/{task_id}` streams progress and the final
    /// report as server-sent events.
    Serve,

    /// Analyze a local file and print the report as JSON on stdout.
    ///
    /// Supported: .pdf .docx .jpg .jpeg .png .bmp .tiff .txt .md
    Analyze {
        /// File to analyze. It is not modified or deleted.
        file: PathBuf,

        /// Progress output on stderr: human, json, or off.
        /// Defaults to human on a terminal, otherwise off.
        #[arg(long)]
        progress: Option<ProgressMode>,

        /// Pretty-print the JSON report.
        #[arg(long)]
        pretty: bool,
    },

    /// Print shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Commands::Serve => {
            let cfg = load_config(&cli.config)?;
            server::run_server(&cfg).await?;
        }
        Commands::Analyze {
            file,
            progress,
            pretty,
        } => {
            let cfg = load_config_or_default(&cli.config)?;
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            analyze_cmd::run_analyze(&cfg, &file, mode, pretty).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "smca", &mut std::io::stdout());
        }
    }

    Ok(())
}
