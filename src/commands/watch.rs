use anyhow::Result;
use calsync_core::remote::MemoryStore;
use calsync_core::sync::{Collection, CollectionView, SyncState};
use chrono::Local;
use clap::ValueEnum;
use owo_colors::OwoColorize;
use tokio::sync::watch;

use crate::app::App;
use crate::commands::{events, shifts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Events,
    Shifts,
}

pub async fn run(app: &App, target: Target) -> Result<()> {
    match target {
        Target::Events => {
            let view = app.events().await?;
            follow(&view, events::print).await
        }
        Target::Shifts => {
            let view = app.shifts().await?;
            follow(&view, |items| shifts::print(&items)).await
        }
    }
}

/// Print the list now and after every change, until Ctrl-C.
async fn follow<C, F>(view: &CollectionView<MemoryStore, C>, print: F) -> Result<()>
where
    C: Collection,
    F: Fn(Vec<C::Item>),
{
    let mut rx = view.watch();
    print_state::<C, _>(&rx, &print);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                print_state::<C, _>(&rx, &print);
            }
        }
    }

    Ok(())
}

fn print_state<C, F>(rx: &watch::Receiver<SyncState<C::Item>>, print: &F)
where
    C: Collection,
    F: Fn(Vec<C::Item>),
{
    let state = rx.borrow().clone();
    if state.is_loading {
        return;
    }

    println!();
    println!(
        "{}",
        format!(
            "── {} · {} ({})",
            C::NAME,
            Local::now().format("%H:%M:%S"),
            state.items.len()
        )
        .dimmed()
    );
    if let Some(error) = &state.error {
        println!("{}", error.red());
    }
    print(state.items);
}
