use anyhow::Result;
use calsync_core::shift::parse_time;
use calsync_core::{Shift, ShiftDraft, ShiftPatch};
use chrono::NaiveTime;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;

/// Flags shared by `shifts new` and `shifts edit`.
#[derive(Default)]
pub struct ShiftArgs {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub background: Option<String>,
    pub text: Option<String>,
    pub size: Option<u8>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn list(app: &App) -> Result<()> {
    let view = app.shifts().await?;
    let shifts = view.items();

    if shifts.is_empty() {
        println!("{}", "No shifts yet".dimmed());
        println!("Add the built-in ones with `calsync shifts import-defaults`.");
        return Ok(());
    }

    print(&shifts);
    Ok(())
}

pub fn print(shifts: &[Shift]) {
    for shift in shifts {
        println!("{}", shift.render());
    }
}

pub async fn new(app: &App, args: ShiftArgs) -> Result<()> {
    let draft = build_draft(args)?;

    let view = app.shifts().await?;
    let id = view.create(&draft).await?;

    println!(
        "{} {}",
        format!("Created: {}", draft.name).green(),
        id.dimmed()
    );

    Ok(())
}

pub async fn edit(app: &App, id: &str, args: ShiftArgs) -> Result<()> {
    let view = app.shifts().await?;
    let shift = find(&view.items(), id)?;

    let patch = build_patch(args)?;
    if patch.is_empty() {
        anyhow::bail!("Nothing to change");
    }

    view.update(id, &patch).await?;
    let name = patch.name.as_deref().unwrap_or(&shift.name);
    println!("{}", format!("Updated: {}", name).green());

    Ok(())
}

pub async fn delete(app: &App, id: &str, force: bool) -> Result<()> {
    let view = app.shifts().await?;
    let shift = find(&view.items(), id)?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete shift \"{}\"?", shift.name))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    view.delete(id).await?;
    println!("{}", format!("Deleted: {}", shift.name).red());

    Ok(())
}

pub async fn import_defaults(app: &App) -> Result<()> {
    let view = app.shifts().await?;

    if !view.items().is_empty() {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "There are already {} shifts. Import the defaults anyway?",
                view.items().len()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    let created = view.import_defaults().await?;
    println!("{}", format!("Imported {} shifts", created).green());

    Ok(())
}

fn find(shifts: &[Shift], id: &str) -> Result<Shift> {
    shifts
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Shift '{}' not found", id))
}

fn build_draft(args: ShiftArgs) -> Result<ShiftDraft> {
    let Some(name) = args.name else {
        anyhow::bail!("A shift needs a name");
    };
    let abbreviation = args
        .abbreviation
        .unwrap_or_else(|| default_abbreviation(&name));

    let mut draft = ShiftDraft::new(name, abbreviation);
    if let Some(background) = args.background {
        draft.background_color = background;
    }
    if let Some(text) = args.text {
        draft.text_color = text;
    }
    draft.text_size = args.size;
    draft.start_time = args.start.as_deref().map(strict_time).transpose()?.flatten();
    draft.end_time = args.end.as_deref().map(strict_time).transpose()?.flatten();

    Ok(draft)
}

fn build_patch(args: ShiftArgs) -> Result<ShiftPatch> {
    Ok(ShiftPatch {
        name: args.name,
        abbreviation: args.abbreviation,
        background_color: args.background,
        text_color: args.text,
        text_size: args.size,
        start_time: args.start.as_deref().map(strict_time).transpose()?,
        end_time: args.end.as_deref().map(strict_time).transpose()?,
    })
}

/// Empty input clears the time; anything else must be `HH:MM`.
fn strict_time(input: &str) -> Result<Option<NaiveTime>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match parse_time(input) {
        Some(time) => Ok(Some(time)),
        None => anyhow::bail!("Invalid time \"{}\". Expected HH:MM, e.g. 08:00", input),
    }
}

/// First three letters, upper-cased.
fn default_abbreviation(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .take(3)
        .collect::<String>()
        .to_uppercase()
}
