use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use ramplo_cli::cmd::{
    self, catalog::CatalogSubcommand, config::ConfigSubcommand,
    connections::ConnectionsSubcommand, progress::ProgressSubcommand, task::TaskSubcommand,
    templates::TemplatesSubcommand,
};
use ramplo_cli::root;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ramplo",
    about = "90-day ramp-up programs for mortgage loan officers: roadmaps, daily tasks, and streaks",
    version,
    propagate_version = true
)]
struct Cli {
    /// RampLO root (default: auto-detect from .ramplo/)
    #[arg(long, global = true, env = "RAMPLO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config and create the database
    Init,

    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
        /// Never call the advisory service
        #[arg(long)]
        offline: bool,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Browse the sprint catalog
    Catalog {
        #[command(subcommand)]
        subcommand: CatalogSubcommand,
    },

    /// Browse outreach templates
    Templates {
        #[command(subcommand)]
        subcommand: TemplatesSubcommand,
    },

    /// Preview the roadmap selected for a profile
    Select {
        /// Questionnaire answers (YAML)
        #[arg(long)]
        profile: PathBuf,
        /// Never call the advisory service
        #[arg(long)]
        offline: bool,
    },

    /// Pick outreach templates for a profile
    SelectTemplates {
        /// Questionnaire answers (YAML)
        #[arg(long)]
        profile: PathBuf,
        #[arg(long, default_value_t = ramplo_core::outreach::DEFAULT_LIMIT)]
        limit: usize,
        /// Never call the advisory service
        #[arg(long)]
        offline: bool,
    },

    /// Select a roadmap for a user and create their tasks
    Onboard {
        #[arg(long)]
        user: String,
        /// Questionnaire answers (YAML)
        #[arg(long)]
        profile: PathBuf,
        /// Program start date (default: today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Never call the advisory service
        #[arg(long)]
        offline: bool,
    },

    /// List and complete tasks
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Show and move progress
    Progress {
        #[command(subcommand)]
        subcommand: ProgressSubcommand,
    },

    /// Log daily client connections
    Connections {
        #[command(subcommand)]
        subcommand: ConnectionsSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Serve { port, offline } => cmd::serve::run(&root, port, offline),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Catalog { subcommand } => cmd::catalog::run(&root, subcommand, cli.json),
        Commands::Templates { subcommand } => cmd::templates::run(&root, subcommand, cli.json),
        Commands::Select { profile, offline } => {
            cmd::select::roadmap(&root, &profile, offline, cli.json)
        }
        Commands::SelectTemplates {
            profile,
            limit,
            offline,
        } => cmd::select::templates(&root, &profile, limit, offline, cli.json),
        Commands::Onboard {
            user,
            profile,
            start,
            offline,
        } => cmd::onboard::run(&root, &user, &profile, start, offline, cli.json),
        Commands::Task { subcommand } => cmd::task::run(&root, subcommand, cli.json),
        Commands::Progress { subcommand } => cmd::progress::run(&root, subcommand, cli.json),
        Commands::Connections { subcommand } => {
            cmd::connections::run(&root, subcommand, cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
