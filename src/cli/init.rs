//! Init command implementation

use std::path::PathBuf;

use colored::Colorize;
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};

use crate::cli::GlobalOptions;
use crate::config::Config;
use crate::error::Result;

/// Run the init command
///
/// Starts from the existing config file when there is one, so re-running
/// init only changes what the user edits.
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let theme = ColorfulTheme::default();
    let mut config = Config::load_at(opts.config_ref()).unwrap_or_default();

    println!("{}", "Welcome to Portfolio Intelligence!".bold().green());
    println!("Let's point pintel at your spreadsheets, database and AI provider.\n");

    let root_default = config.project_root().display().to_string();
    let project_root: String = Input::with_theme(&theme)
        .with_prompt("Project root (contains scripts/)")
        .default(root_default)
        .interact_text()?;
    config.project_root = Some(PathBuf::from(project_root.trim()));

    if !config.scripts_dir().is_dir() {
        println!(
            "{} No scripts/ directory under {}; spreadsheet sections will be unavailable.",
            "⚠".yellow(),
            project_root.trim()
        );
    }

    config.python = Input::with_theme(&theme)
        .with_prompt("Python interpreter")
        .default(config.python.clone())
        .interact_text()?;

    let database_default = config
        .database_url
        .clone()
        .unwrap_or_else(|| "file:./dev.db".to_string());
    let database_url: String = Input::with_theme(&theme)
        .with_prompt("Database URL")
        .default(database_default)
        .interact_text()?;
    config.database_url = Some(database_url);

    let api_key: String = Password::with_theme(&theme)
        .with_prompt("Anthropic API key (leave empty to skip AI briefings)")
        .allow_empty_password(true)
        .interact()?;
    if !api_key.trim().is_empty() {
        config.ai.api_key = Some(api_key.trim().to_string());
    }

    config.cache.demo_mode = Confirm::with_theme(&theme)
        .with_prompt("Enable demo mode (longer cache lifetimes)?")
        .default(config.cache.demo_mode)
        .interact()?;

    config.validate()?;
    config.save_at(opts.config_ref())?;

    let config_path = match opts.config_ref() {
        Some(path) => PathBuf::from(path),
        None => Config::default_path()?,
    };
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        config_path.display()
    );
    if config.ai.api_key.is_none() {
        println!(
            "  {} AI briefings disabled until ANTHROPIC_API_KEY is set",
            "○".dimmed()
        );
    }

    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Check data sources", "pintel health".cyan());
    println!("  {} - Revenue and margin overview", "pintel dashboard".cyan());
    println!("  {} - Everything at once", "pintel report".cyan());

    Ok(())
}
