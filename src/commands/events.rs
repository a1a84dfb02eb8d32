use anyhow::Result;
use calsync_core::remote::MemoryStore;
use calsync_core::sync::{CollectionView, Events};
use calsync_core::{CalendarEvent, EventCategory, EventDraft, EventPatch};
use chrono::{DateTime, Utc};
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::dates::{self, When};
use crate::render::{self, Render};

pub struct NewArgs {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Default)]
pub struct EditArgs {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

pub async fn list(app: &App) -> Result<()> {
    let view = app.events().await?;
    print(view.items());
    Ok(())
}

/// Events by start time, grouped under day headings.
pub fn print(mut events: Vec<CalendarEvent>) {
    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return;
    }

    events.sort_by_key(|e| e.start);

    let mut current_date: Option<String> = None;
    for event in &events {
        let label = render::date_label(event);
        if current_date.as_ref() != Some(&label) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", label.bold());
            current_date = Some(label);
        }
        println!("{}", event.render());
    }
}

pub async fn new(app: &App, args: NewArgs) -> Result<()> {
    let start = dates::parse_when(&args.start)?;
    let end = match (&args.end, &args.duration) {
        (Some(end), _) => dates::parse_end(end, &start)?,
        (None, Some(duration)) => dates::apply_duration(start.at, duration)?,
        (None, None) => dates::default_end(&start)?,
    };
    warn_if_inverted(start.at, end);

    let mut draft = EventDraft::new(args.title, start.at, end);
    if let Some(category) = args.category {
        draft = draft.with_category(parse_category(&category)?);
    }
    if let Some(description) = args.description.filter(|d| !d.is_empty()) {
        draft = draft.with_description(description);
    }

    let view = app.events().await?;
    let id = view.create(&draft).await?;

    println!(
        "{} {}",
        format!("Created: {}", draft.title).green(),
        id.dimmed()
    );

    Ok(())
}

pub async fn edit(app: &App, id: &str, args: EditArgs) -> Result<()> {
    let view = app.events().await?;
    let event = find_editable(&view, id)?;

    let patch = build_patch(&event, args)?;
    if patch.is_empty() {
        anyhow::bail!(
            "Nothing to change. Pass at least one of --title, --start, --end, \
            --duration, --category or --description."
        );
    }

    let start = patch.start.unwrap_or(event.start);
    let end = patch.end.unwrap_or(event.end);
    warn_if_inverted(start, end);

    view.update(id, &patch).await?;
    let title = patch.title.as_deref().unwrap_or(&event.title);
    println!("{}", format!("Updated: {}", title).green());

    Ok(())
}

pub async fn delete(app: &App, id: &str, force: bool) -> Result<()> {
    let view = app.events().await?;
    let event = find_editable(&view, id)?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete \"{}\"?", event.title))
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    view.delete(id).await?;
    println!("{}", format!("Deleted: {}", event.title).red());

    Ok(())
}

/// Look up `id` in the loaded list and make sure the current user owns it.
fn find_editable(view: &CollectionView<MemoryStore, Events>, id: &str) -> Result<CalendarEvent> {
    let Some(event) = view.items().into_iter().find(|e| e.id == id) else {
        anyhow::bail!("Event '{}' not found", id);
    };

    if !view.can_edit(&event) {
        anyhow::bail!(
            "\"{}\" belongs to {}. Only its creator can change it.",
            event.title,
            event.owner_name
        );
    }

    Ok(event)
}

/// Turn edit flags into a patch. Moving the start without a new end keeps
/// the event's length.
fn build_patch(event: &CalendarEvent, args: EditArgs) -> Result<EventPatch> {
    let mut patch = EventPatch {
        title: args.title,
        ..EventPatch::default()
    };

    let start = match &args.start {
        Some(input) => {
            let when = dates::parse_when(input)?;
            patch.start = Some(when.at);
            when
        }
        None => When {
            at: event.start,
            timed: true,
        },
    };

    patch.end = match (&args.end, &args.duration) {
        (Some(end), _) => Some(dates::parse_end(end, &start)?),
        (None, Some(duration)) => Some(dates::apply_duration(start.at, duration)?),
        (None, None) if args.start.is_some() => {
            Some(dates::shift_by(start.at, event.end - event.start)?)
        }
        (None, None) => None,
    };

    if let Some(category) = args.category {
        patch.category = Some(parse_category(&category)?);
    }

    patch.description = args
        .description
        .map(|d| if d.is_empty() { None } else { Some(d) });

    Ok(patch)
}

fn parse_category(input: &str) -> Result<EventCategory> {
    input.parse::<EventCategory>().map_err(anyhow::Error::msg)
}

fn warn_if_inverted(start: DateTime<Utc>, end: DateTime<Utc>) {
    if end < start {
        eprintln!("{}", "  Warning: the event ends before it starts".yellow());
    }
}
