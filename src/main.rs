mod app;
mod commands;
mod dates;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Shared family calendar and shift catalog, synced live")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose who you are
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Calendar events
    Events {
        #[command(subcommand)]
        action: EventsAction,
    },
    /// Shift catalog
    Shifts {
        #[command(subcommand)]
        action: ShiftsAction,
    },
    /// Print a collection every time it changes, until Ctrl-C
    Watch {
        #[arg(value_enum, default_value_t = commands::watch::Target::Events)]
        target: commands::watch::Target,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Select the current user (picker when no id is given)
    Select { id: Option<String> },
    /// Add a user to the roster
    Add {
        id: String,
        display_name: String,

        #[arg(long)]
        email: Option<String>,
    },
    /// Show the current user
    Show,
    /// Forget the current user
    Change,
}

#[derive(Subcommand)]
enum EventsAction {
    List,
    New {
        title: String,

        /// Start date/time (e.g., "tomorrow 3pm", "march 20 15:00")
        #[arg(short, long)]
        start: String,

        /// End date/time
        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        /// Duration (e.g., "30m", "2h")
        #[arg(short, long)]
        duration: Option<String>,

        /// medical, recreation, payment, personal, work or other
        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        #[arg(short, long)]
        duration: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// New description; pass "" to remove it
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ShiftsAction {
    List,
    New {
        name: String,

        #[arg(short, long)]
        abbreviation: Option<String>,

        /// Background color (e.g., "#1E90FF")
        #[arg(long)]
        background: Option<String>,

        /// Text color
        #[arg(long)]
        text: Option<String>,

        /// Text size (8-24)
        #[arg(long)]
        size: Option<u8>,

        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<String>,

        /// End time (HH:MM)
        #[arg(long)]
        end: Option<String>,
    },
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        abbreviation: Option<String>,

        #[arg(long)]
        background: Option<String>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        size: Option<u8>,

        /// Start time (HH:MM); pass "" to clear it
        #[arg(long)]
        start: Option<String>,

        /// End time (HH:MM); pass "" to clear it
        #[arg(long)]
        end: Option<String>,
    },
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Add the built-in shift catalog
    ImportDefaults,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calsync=warn,calsync_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let app = App::load()?;

    match cli.command {
        Commands::User { action } => match action {
            UserAction::Select { id } => commands::user::select(&app, id),
            UserAction::Add {
                id,
                display_name,
                email,
            } => commands::user::add(&app, id, display_name, email),
            UserAction::Show => commands::user::show(&app),
            UserAction::Change => commands::user::change(&app),
        },
        Commands::Events { action } => match action {
            EventsAction::List => commands::events::list(&app).await,
            EventsAction::New {
                title,
                start,
                end,
                duration,
                category,
                description,
            } => {
                let args = commands::events::NewArgs {
                    title,
                    start,
                    end,
                    duration,
                    category,
                    description,
                };
                commands::events::new(&app, args).await
            }
            EventsAction::Edit {
                id,
                title,
                start,
                end,
                duration,
                category,
                description,
            } => {
                let args = commands::events::EditArgs {
                    title,
                    start,
                    end,
                    duration,
                    category,
                    description,
                };
                commands::events::edit(&app, &id, args).await
            }
            EventsAction::Delete { id, force } => commands::events::delete(&app, &id, force).await,
        },
        Commands::Shifts { action } => match action {
            ShiftsAction::List => commands::shifts::list(&app).await,
            ShiftsAction::New {
                name,
                abbreviation,
                background,
                text,
                size,
                start,
                end,
            } => {
                let args = commands::shifts::ShiftArgs {
                    name: Some(name),
                    abbreviation,
                    background,
                    text,
                    size,
                    start,
                    end,
                };
                commands::shifts::new(&app, args).await
            }
            ShiftsAction::Edit {
                id,
                name,
                abbreviation,
                background,
                text,
                size,
                start,
                end,
            } => {
                let args = commands::shifts::ShiftArgs {
                    name,
                    abbreviation,
                    background,
                    text,
                    size,
                    start,
                    end,
                };
                commands::shifts::edit(&app, &id, args).await
            }
            ShiftsAction::Delete { id, force } => commands::shifts::delete(&app, &id, force).await,
            ShiftsAction::ImportDefaults => commands::shifts::import_defaults(&app).await,
        },
        Commands::Watch { target } => commands::watch::run(&app, target).await,
    }
}
