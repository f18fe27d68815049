use anyhow::{Result, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use env_logger::{Env, Target};
use log::{info, error};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::process;

use local_accounts::config::{self, Config};
use local_accounts::AccountStore;

mod cli;

/// Local account manager - register, log in, and edit accounts stored in a JSON file
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Sets the configuration file (searched in the default locations when omitted)
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the accounts file from the configuration
    #[clap(short, long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Turn debugging information on
    #[clap(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        /// Account email
        #[clap(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[clap(short, long)]
        password: Option<String>,
    },

    /// Log in to an account
    Login {
        /// Account email
        #[clap(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[clap(short, long)]
        password: Option<String>,
    },

    /// Change an account's email or password
    Update {
        /// Current account email
        #[clap(short, long)]
        email: String,

        /// New email (keeps the current one when omitted)
        #[clap(long)]
        new_email: Option<String>,

        /// Current password (prompted for when omitted)
        #[clap(short, long)]
        password: Option<String>,

        /// New password (prompted for when omitted; blank keeps the current one)
        #[clap(long)]
        new_password: Option<String>,
    },

    /// Show an account's profile after logging in
    Show {
        /// Account email
        #[clap(short, long)]
        email: String,

        /// Password (prompted for when omitted)
        #[clap(short, long)]
        password: Option<String>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination file (.toml or .json)
        #[clap(default_value = "app_config.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },
}

/// Configure env_logger from the logging section, appending to the log file when one is set
fn init_logging(config: &Config, verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.target(),
            record.level(),
            record.args()
        )
    });

    if let Some(path) = &config.logging.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("Failed to initialize logger")?;
    Ok(())
}

fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    if let Commands::InitConfig { path, force } = &cli.command {
        if let Err(err) = cli::user::init_config(path, *force) {
            eprintln!("Error: {:#}", err);
            process::exit(1);
        }
        return;
    }

    let mut config = match config::resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {:#}", err);
            process::exit(1);
        }
    };

    if let Some(store_path) = &cli.store {
        config.database.path = store_path.display().to_string();
    }

    if let Err(err) = init_logging(&config, cli.debug) {
        eprintln!("{:#}", err);
    }

    info!("Starting {} v{}", config.app_name, config.version);

    let mut store = AccountStore::from_config(&config);

    // Process the command
    let result = match &cli.command {
        Commands::Register { email, password } => {
            cli::user::register(&mut store, email, password.as_deref())
        }
        Commands::Login { email, password } => {
            cli::auth::login(&mut store, email, password.as_deref()).map(|_| ())
        }
        Commands::Update { email, new_email, password, new_password } => cli::user::update(
            &mut store,
            email,
            new_email.as_deref(),
            password.as_deref(),
            new_password.as_deref(),
        ),
        Commands::Show { email, password } => {
            cli::user::show(&mut store, email, password.as_deref())
        }
        Commands::InitConfig { .. } => Ok(()),
    };

    if let Err(err) = result {
        error!("Command failed: {:#}", err);
        process::exit(1);
    }
}
