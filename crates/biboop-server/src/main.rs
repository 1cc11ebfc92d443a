//! Biboop administrative CLI.
//!
//! Drives the identity resolver and registries against a local entity store.
//! Results are printed as JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use biboop_core::config::load_config;
use biboop_core::tracing_init::init_tracing;
use biboop_server::requests::{CreateCommandRequest, PollRequest, UpdateServerRequest};
use biboop_server::storage::CommandParam;
use biboop_server::{AppState, Principal};

#[derive(Parser, Debug)]
#[command(name = "biboop")]
#[command(version, about = "Biboop - server registry and command catalogue")]
struct Args {
    /// Path to a JSON settings file layered over the global one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Bypass the entity cache.
    #[arg(long)]
    no_cache: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Cmd,
}

/// Who is making the request.
#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct Caller {
    /// Act as the user with this email (created on first use).
    #[arg(long)]
    email: Option<String>,

    /// Act as a server presenting this API key.
    #[arg(long, env = "BIBOOP_SERVER_API_KEY")]
    secret: Option<String>,
}

impl TryFrom<Caller> for Principal {
    type Error = anyhow::Error;

    fn try_from(caller: Caller) -> anyhow::Result<Self> {
        match (caller.email, caller.secret) {
            (Some(email), None) => Ok(Self::Email(email)),
            (None, Some(secret)) => Ok(Self::ServerSecret(secret)),
            _ => anyhow::bail!("exactly one of --email or --secret is required"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Resolve the caller to its user record.
    Whoami {
        #[command(flatten)]
        caller: Caller,
    },
    /// Send a heartbeat for a server.
    Poll {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        server_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Create or edit a server.
    UpdateServer {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        server_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the caller's servers.
    Servers {
        #[command(flatten)]
        caller: Caller,
    },
    /// Define a new command.
    AddCommand {
        #[command(flatten)]
        caller: Caller,
        #[arg(long)]
        name: String,
        #[arg(long)]
        command: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        private: bool,
        /// Parameter as `name` or `name=default`. Repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<CommandParam>,
    },
    /// List the caller's commands.
    Commands {
        #[command(flatten)]
        caller: Caller,
    },
}

fn parse_param(raw: &str) -> Result<CommandParam, String> {
    let (name, default_value) = raw.split_once('=').unwrap_or((raw, ""));
    if name.is_empty() {
        return Err(format!("invalid param {raw:?}: name is empty"));
    }
    Ok(CommandParam {
        name: name.to_string(),
        description: String::new(),
        default_value: default_value.to_string(),
    })
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = args.db_path {
        config.store.database_path = Some(path);
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
    if args.log_json {
        config.logging.json = true;
    }

    init_tracing(&["biboop_server", "biboop_core"], &config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting biboop");

    let state = AppState::open(&config).await?;
    let result = run(&state, args.command).await;

    let stats = state.cache().stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        errors = stats.errors,
        hit_rate = stats.hit_rate(),
        "Cache statistics"
    );
    state.store().close().await;
    result
}

async fn run(state: &AppState, command: Cmd) -> anyhow::Result<()> {
    match command {
        Cmd::Whoami { caller } => {
            let user = state.request(Principal::try_from(caller)?).user().await?;
            print_json(&user)
        }
        Cmd::Poll {
            caller,
            server_id,
            name,
            description,
        } => {
            let request = PollRequest {
                server_id,
                name,
                description,
            };
            let server = state.request(Principal::try_from(caller)?).poll(&request).await?;
            print_json(&server)
        }
        Cmd::UpdateServer {
            caller,
            server_id,
            name,
            description,
        } => {
            let request = UpdateServerRequest {
                server_id,
                name,
                description,
            };
            let server = state
                .request(Principal::try_from(caller)?)
                .update_server(&request)
                .await?;
            print_json(&server)
        }
        Cmd::Servers { caller } => {
            let servers = state.request(Principal::try_from(caller)?).list_servers().await?;
            print_json(&servers)
        }
        Cmd::AddCommand {
            caller,
            name,
            command,
            description,
            private,
            params,
        } => {
            let request = CreateCommandRequest {
                name,
                description,
                command,
                private,
                params,
            };
            let created = state
                .request(Principal::try_from(caller)?)
                .create_command(&request)
                .await?;
            print_json(&created)
        }
        Cmd::Commands { caller } => {
            let commands = state.request(Principal::try_from(caller)?).list_commands().await?;
            print_json(&commands)
        }
    }
}
