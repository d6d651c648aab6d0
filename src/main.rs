// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Parser, Subcommand};
use remote_lock::commands::AcquireArgs;
use remote_lock::commands::acquire::AcquireCommand;
use remote_lock::commands::config::ConfigCommand;
use remote_lock::commands::purge::PurgeCommand;
use remote_lock::commands::release::ReleaseCommand;
use remote_lock::commands::run::RunCommand;
use remote_lock::commands::status::StatusCommand;
use remote_lock::config::{RemoteLockConfig, resolve_home};
use remote_lock::error::{RemoteLockError, Result, format_error_with_color, get_exit_code};
use remote_lock::logging;
use std::io::{IsTerminal, stderr};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "remote-lock")]
#[command(author, version, about = "Mutual exclusion over a shared lock store", long_about = None)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read configuration from this file instead of <home>/config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Namespace prepended to every lock key
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Directory holding file-store lock records
    #[arg(long, value_name = "DIR", global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program while holding a lock
    #[command(visible_alias = "exec")]
    Run {
        /// Resource to lock
        key: String,

        #[command(flatten)]
        acquire: AcquireArgs,

        /// Program to run, followed by its arguments
        #[arg(last = true, required = true, value_name = "PROGRAM")]
        program: Vec<String>,
    },

    /// Acquire a lock and keep it until release or expiry
    Acquire {
        /// Resource to lock
        key: String,

        #[command(flatten)]
        acquire: AcquireArgs,
    },

    /// Release a lock
    Release {
        /// Resource to unlock
        key: String,
    },

    /// Show whether a lock is currently held
    Status {
        /// Resource to inspect
        key: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove expired records and leftover temporary files from the file store
    Purge,

    /// Print the effective configuration
    Config,
}

fn setup_logger(cli: &Cli) {
    logging::setup_logger(cli.verbose);
}

fn load_config(cli: &Cli) -> Result<RemoteLockConfig> {
    let home = resolve_home()?;
    let mut config = RemoteLockConfig::load(&home, cli.config.as_deref())?;
    if let Some(prefix) = &cli.prefix {
        config.prefix = Some(prefix.clone());
    }
    if let Some(dir) = &cli.store_dir {
        config.store.directory = Some(dir.clone());
    }
    Ok(config)
}

fn main() {
    let cli = Cli::parse();

    // Initialize logger based on CLI flags and environment
    setup_logger(&cli);

    // Load configuration once at startup
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_error_with_color(&e, stderr().is_terminal()));
            std::process::exit(get_exit_code(&e));
        }
    };

    let result: Result<i32> = (|| match cli.command {
        Commands::Run {
            key,
            acquire,
            program,
        } => {
            let command = RunCommand::new(&config)?;
            let Some((program, args)) = program.split_first() else {
                return Err(RemoteLockError::InvalidConfig(
                    "run requires a program after --".to_string(),
                ));
            };
            command.execute(&key, &acquire, program, args)
        }
        Commands::Acquire { key, acquire } => {
            let command = AcquireCommand::new(&config)?;
            command.execute(&key, &acquire).map(|()| 0)
        }
        Commands::Release { key } => {
            let command = ReleaseCommand::new(&config)?;
            command.execute(&key).map(|()| 0)
        }
        Commands::Status { key, json } => {
            let command = StatusCommand::new(&config)?;
            command.execute(&key, json).map(|()| 0)
        }
        Commands::Purge => {
            let command = PurgeCommand::new(&config)?;
            command.execute().map(|()| 0)
        }
        Commands::Config => {
            let command = ConfigCommand::new(&config)?;
            command.execute().map(|()| 0)
        }
    })();

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", format_error_with_color(&e, stderr().is_terminal()));
            std::process::exit(get_exit_code(&e));
        }
    }
}
