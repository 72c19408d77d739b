//! CLI commands for tunecast using clap.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{get_settings_path, load_settings, save_settings_to, Settings};
use crate::storage::{SettingsStore, SqliteStore};

/// tunecast - Telegram voice chat music bot.
#[derive(Parser)]
#[command(name = "tunecast")]
#[command(version)]
#[command(about = "Play music and video in Telegram voice chats", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the bot in the foreground
    Run {
        /// Bot token, overrides the settings file
        #[arg(long, env = "TUNECAST_BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Write a settings file
    Setup {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },

    /// List channel-play bindings
    Bindings,

    /// Switch play logging on or off
    Logger {
        #[arg(value_enum)]
        action: LoggerAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoggerAction {
    On,
    Off,
    Status,
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Run { token } => cmd_run(token.clone()).await,
            Command::Setup { force } => cmd_setup(*force).await,
            Command::Bindings => cmd_bindings().await,
            Command::Logger { action } => cmd_logger(*action).await,
        }
    }
}

// Command implementations

async fn cmd_run(token: Option<String>) -> Result<()> {
    let settings = load_settings()?;
    crate::telegram::run_bot(settings, token).await?;
    Ok(())
}

async fn cmd_setup(force: bool) -> Result<()> {
    let path = get_settings_path()?;
    if path.exists() && !force {
        println!("Settings already exist at {}", path.display());
        println!("Use 'tunecast setup --force' to overwrite.");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print!("Telegram Bot Token (from @BotFather, empty to set later): ");
    stdout.flush()?;
    let mut bot_token = String::new();
    stdin.lock().read_line(&mut bot_token)?;
    let bot_token = bot_token.trim().to_string();

    print!("Your Telegram user id for sudo (empty to skip): ");
    stdout.flush()?;
    let mut sudo = String::new();
    stdin.lock().read_line(&mut sudo)?;
    let sudoers = match sudo.trim() {
        "" => Vec::new(),
        id => vec![id.parse::<u64>()?],
    };

    let settings = Settings {
        bot_token: (!bot_token.is_empty()).then_some(bot_token),
        sudoers,
        ..Settings::default()
    };
    save_settings_to(&path, &settings)?;
    std::fs::create_dir_all(settings.downloads_dir()?)?;

    println!("✓ Settings written to {}", path.display());
    println!("Set player_command there to enable voice chat playback.");
    Ok(())
}

fn open_store() -> Result<SqliteStore> {
    let settings = load_settings()?;
    Ok(SqliteStore::open(&settings.database_path()?)?)
}

async fn cmd_bindings() -> Result<()> {
    let store = open_store()?;
    let bindings = store.bindings().await?;
    if bindings.is_empty() {
        println!("No channel-play bindings.");
        return Ok(());
    }
    println!("{:<20} {:<20} UPDATED", "GROUP", "CHANNEL");
    for b in bindings {
        let updated = chrono::DateTime::from_timestamp_millis(b.updated_at)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<20} {:<20} {}", b.group_id, b.channel_id, updated);
    }
    Ok(())
}

async fn cmd_logger(action: LoggerAction) -> Result<()> {
    let store = open_store()?;
    match action {
        LoggerAction::On => store.set_logger(true).await?,
        LoggerAction::Off => store.set_logger(false).await?,
        LoggerAction::Status => {}
    }
    let enabled = store.is_logger().await?;
    println!("Play logging is {}", if enabled { "on" } else { "off" });
    Ok(())
}
