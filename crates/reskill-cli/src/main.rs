mod app;
mod auth_cmds;
mod config;
mod mentor_cmd;
mod news_cmd;
mod plan_cmds;
mod profile_cmds;
mod session_file;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reskill_store::models::{InterestArea, LearningStyle, SkillLevel};

use app::{App, StoreKind};
use config::ReskillConfig;

#[derive(Parser)]
#[command(name = "reskill", about = "Career reskilling companion: AI mentor, news and weekly study plans")]
struct Cli {
    /// Document store backend
    #[arg(long, global = true, value_enum, default_value_t = StoreKind::Rest)]
    store: StoreKind,

    /// Database URL (overrides RESKILL_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Show debug logs (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a reskill config file
    Init {
        /// Gemini API key
        #[arg(long)]
        gemini_key: String,
        /// Firebase web API key
        #[arg(long)]
        firebase_key: String,
        /// Realtime Database URL
        #[arg(long)]
        db_url: String,
        /// Gemini model name
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and remember the session
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the saved session
    Signout,
    /// Show who is signed in
    Whoami,
    /// Profile management
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Weekly study plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Generate a batch of job-market news
    News,
    /// Chat with the AI career mentor
    Mentor,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile
    Show,
    /// Update profile fields (omitted fields are left alone)
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        goal: Option<String>,
        /// iniciante, intermediário or avançado
        #[arg(long)]
        level: Option<SkillLevel>,
        /// Hours per week; anything that is not a positive number counts as 0
        #[arg(long)]
        hours: Option<String>,
        /// vídeo, leitura or misto
        #[arg(long)]
        style: Option<LearningStyle>,
        /// ia, frontend, backend, dados, gestao or uxui
        #[arg(long, conflicts_with = "clear_area")]
        area: Option<InterestArea>,
        /// Remove the interest area
        #[arg(long)]
        clear_area: bool,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show this week's plan
    Show,
    /// Generate (or regenerate) this week's plan from the profile
    Generate,
    /// Mark a task done or not done
    Toggle {
        /// Task ID as shown by `reskill plan show`
        task_id: String,
    },
    /// Print the plan again on every change until Ctrl+C
    Watch,
}

/// Execute the `reskill init` command: write config file.
fn cmd_init(
    gemini_key: String,
    firebase_key: String,
    db_url: String,
    model: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        generation: config::GenerationSection {
            api_key: Some(gemini_key),
            model,
            endpoint: None,
        },
        firebase: config::FirebaseSection {
            api_key: Some(firebase_key),
            database_url: Some(db_url.clone()),
            identity_endpoint: None,
            token_endpoint: None,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  firebase.database_url = {db_url}");
    println!();
    println!("Next: run `reskill signup` or `reskill signin`.");

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        store,
        database_url,
        command,
        ..
    } = cli;
    let open_app = || App::new(ReskillConfig::resolve(database_url.as_deref())?, store);

    match command {
        Commands::Init {
            gemini_key,
            firebase_key,
            db_url,
            model,
            force,
        } => cmd_init(gemini_key, firebase_key, db_url, model, force),
        Commands::Signup { email, password } => {
            auth_cmds::cmd_signup(&open_app()?, &email, &password).await
        }
        Commands::Signin { email, password } => {
            auth_cmds::cmd_signin(&open_app()?, &email, &password).await
        }
        Commands::Signout => auth_cmds::cmd_signout(&open_app()?).await,
        Commands::Whoami => auth_cmds::cmd_whoami(&open_app()?),
        Commands::Profile { command } => {
            profile_cmds::run_profile_command(command, &open_app()?).await
        }
        Commands::Plan { command } => plan_cmds::run_plan_command(command, &open_app()?).await,
        Commands::News => news_cmd::cmd_news(&open_app()?).await,
        Commands::Mentor => mentor_cmd::cmd_mentor(&open_app()?).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
