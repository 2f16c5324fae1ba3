mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, project::ProjectSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sejr",
    about = "Sejrliste enforcement engine: drive checklist checkpoints to verified completion",
    version,
    propagate_version = true
)]
struct Cli {
    /// Sejrliste root (default: auto-detect from sejr.yaml or 10_ACTIVE/)
    #[arg(long, global = true, env = "SEJR_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and list active projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Show progress and the current checkpoint of a project
    Status { project: String },

    /// List every checkpoint of a project with its state
    Timeline { project: String },

    /// Start working on a checkpoint
    Start { project: String, id: String },

    /// Verify a checkpoint (runs its command, checks its file, or records proof)
    Verify {
        project: String,
        id: String,
        /// Evidence for manually verified checkpoints
        #[arg(long)]
        proof: Option<String>,
    },

    /// Defer a checkpoint; it must still be verified before archiving
    Skip {
        project: String,
        id: String,
        #[arg(required = true)]
        reason: Vec<String>,
    },

    /// Archive a fully verified project
    Archive {
        project: String,
        /// Only report whether the project could be archived
        #[arg(long)]
        check: bool,
    },

    /// Discard the enforcement state and regenerate it from the checklist
    Reset { project: String },

    /// Print timeline and archive eligibility for every active project
    Scan,

    /// Inspect and validate sejr.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Status { project } => cmd::checkpoint::status(&root, &project, cli.json),
        Commands::Timeline { project } => cmd::checkpoint::timeline(&root, &project, cli.json),
        Commands::Start { project, id } => cmd::checkpoint::start(&root, &project, &id, cli.json),
        Commands::Verify { project, id, proof } => {
            cmd::checkpoint::verify(&root, &project, &id, proof.as_deref(), cli.json)
        }
        Commands::Skip { project, id, reason } => {
            cmd::checkpoint::skip(&root, &project, &id, &reason.join(" "), cli.json)
        }
        Commands::Archive { project, check } => cmd::archive::run(&root, &project, check, cli.json),
        Commands::Reset { project } => cmd::checkpoint::reset(&root, &project, cli.json),
        Commands::Scan => cmd::scan::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
