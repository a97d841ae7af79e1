//! protonhook CLI
//!
//! Thin front-end over the library: locate a Steam game's install
//! directory, or set the winhttp override in its Proton prefix.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use protonhook::api::{render_override_outcome, resolve_game_install_dir, try_apply_override};
use protonhook::logging::{init_logger, log_error};

#[derive(Parser)]
#[command(name = "protonhook", version, about = "Configure Proton prefixes for DLL-based loaders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate a Steam game's install directory by (partial) name
    Locate {
        /// Game name, matched case-insensitively against installed games
        #[arg(short, long)]
        name: String,
    },
    /// Set the winhttp DLL override in a game's Proton prefix
    Override {
        /// Steam App ID of the game
        #[arg(long)]
        app_id: u32,
        /// DLL to override (only winhttp is supported)
        #[arg(long, default_value = "winhttp")]
        dll: String,
        /// App whose compatdata version marker pins the Proton build
        #[arg(long)]
        ref_app_id: Option<u32>,
    },
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Locate { name } => match resolve_game_install_dir(&name) {
            Ok(path) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            Err(err) => {
                log_error(&err.to_string());
                ExitCode::FAILURE
            }
        },
        Commands::Override {
            app_id,
            dll,
            ref_app_id,
        } => {
            let status = render_override_outcome(try_apply_override(app_id, &dll, ref_app_id));
            ExitCode::from(status as u8)
        }
    }
}
