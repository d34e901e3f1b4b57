// shici - browse classical Chinese poetry from the terminal
//
// Architecture:
// - Config: env > ~/.config/shici/config.toml > defaults
// - App: session store (persisted to a JSON file), HTTP client, router
// - CLI: each subcommand goes through the router guard, then a hook or
//   account operation, then prints plain text

use anyhow::Result;
use clap::Parser;

use shici::app::App;
use shici::cli::{self, Cli};
use shici::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle config commands first; they never touch the backend
    if cli::handle_config_command(&cli.command)? {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();
    let config = Config::load()?;

    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard = shici::logging::init(&config.logging);

    let app = App::from_config(config)?;
    let watcher = app.spawn_session_watcher();

    let result = cli::run(&app, cli.command).await;

    watcher.abort();
    result
}
