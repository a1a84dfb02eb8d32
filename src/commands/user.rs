use anyhow::Result;
use calsync_core::config::{CalSyncConfig, RosterEntry};
use calsync_core::Identity;
use dialoguer::Select;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

pub fn select(app: &App, id: Option<String>) -> Result<()> {
    let entry = resolve_user(&app.config, id)?;
    let identity = Identity::from(entry);

    app.identity.select(identity.clone())?;
    println!("{}", format!("Signed in as {}", identity.name()).green());

    Ok(())
}

/// Add someone to the roster in the config file.
pub fn add(app: &App, id: String, display_name: String, email: Option<String>) -> Result<()> {
    let mut config = app.config.clone();
    config.add_user(RosterEntry {
        id: id.clone(),
        display_name: display_name.clone(),
        email,
        avatar_url: None,
    })?;
    config.save()?;

    println!("{}", format!("Added {} ({})", display_name, id).green());
    println!("Select them with `calsync user select {}`.", id);

    Ok(())
}

pub fn show(app: &App) -> Result<()> {
    match app.identity.current() {
        Some(identity) => {
            println!("{}", identity.render());
            println!("{}", identity.id.dimmed());
        }
        None => println!("{}", "No user selected".dimmed()),
    }

    Ok(())
}

pub fn change(app: &App) -> Result<()> {
    if !app.identity.is_selected() {
        println!("{}", "No user selected".dimmed());
        return Ok(());
    }

    app.identity.change()?;
    println!("Signed out. Pick someone else with `calsync user select`.");

    Ok(())
}

fn resolve_user(config: &CalSyncConfig, id: Option<String>) -> Result<&RosterEntry> {
    if config.users.is_empty() {
        let path = CalSyncConfig::config_path()?;
        anyhow::bail!(
            "No users configured.\n\n\
            Add one with `calsync user add <id> <name>`, or edit {}:\n\n  \
            [[users]]\n  \
            id = \"ana\"\n  \
            display_name = \"Ana\"",
            path.display()
        );
    }

    if let Some(id) = id {
        return config.find_user(&id).ok_or_else(|| {
            let available: Vec<_> = config.users.iter().map(|u| u.id.as_str()).collect();
            anyhow::anyhow!(
                "User '{}' not found. Available: {}",
                id,
                available.join(", ")
            )
        });
    }

    let names: Vec<&str> = config.users.iter().map(|u| u.display_name.as_str()).collect();
    let selection = Select::new()
        .with_prompt("  Who are you?")
        .items(&names)
        .default(0)
        .interact()?;

    Ok(&config.users[selection])
}
