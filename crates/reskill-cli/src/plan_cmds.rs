//! `reskill plan` subcommands.
//!
//! Implements:
//! - `reskill plan show`            -- this week's plan
//! - `reskill plan generate`        -- (re)generate this week's plan from the profile
//! - `reskill plan toggle <task-id>` -- flip one task's done flag
//! - `reskill plan watch`           -- print the plan on every remote change

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use reskill_core::WeekId;
use reskill_core::plan::{PLAN_CREATED_MESSAGE, PlanBoard, PlanError};
use reskill_store::queries::plans;
use reskill_store::{Store, Subscription};

use crate::PlanCommands;
use crate::app::App;

const NO_PLAN_TEXT: &str =
    "Você ainda não tem um plano para esta semana. Gere um plano com base no seu perfil.";

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_plan_command(command: PlanCommands, app: &App) -> Result<()> {
    let store = app.store().await?;
    let mut board = PlanBoard::for_session(app.signal(), WeekId::current()).map_err(friendly)?;
    board
        .load(store.as_ref())
        .await
        .context("failed to load profile and plan")?;

    match command {
        PlanCommands::Show => {
            print!("{}", render_board(&board));
        }
        PlanCommands::Generate => {
            let generator = app.generator()?;
            board
                .generate(&generator, store.as_ref())
                .await
                .map_err(friendly)?;
            println!("{PLAN_CREATED_MESSAGE}");
            println!();
            print!("{}", render_board(&board));
        }
        PlanCommands::Toggle { task_id } => {
            let done = board
                .toggle_task(store.as_ref(), &task_id)
                .await
                .with_context(|| format!("failed to toggle task {task_id}"))?;
            let state = if done { "concluída" } else { "não concluída" };
            println!("Tarefa {task_id} marcada como {state}.");
        }
        PlanCommands::Watch => cmd_watch(board, store).await?,
    }
    Ok(())
}

/// Attach the user-facing text to a plan failure.
fn friendly(err: PlanError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

// -----------------------------------------------------------------------
// reskill plan watch
// -----------------------------------------------------------------------

async fn cmd_watch(mut board: PlanBoard, store: Arc<dyn Store>) -> Result<()> {
    let week = board.week().to_string();
    let mut sub = plans::watch_plan(store.as_ref(), board.uid(), &week)
        .await
        .context("failed to subscribe to the plan")?;

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    eprintln!("Watching plan {week} (Ctrl+C to stop)...");
    follow_plan(&mut board, &mut sub, &cancel, |board| {
        println!("{}", render_board(board));
    })
    .await?;
    Ok(())
}

/// Apply snapshots to the board and render each one until cancelled or
/// the subscription ends. Returns how many snapshots were shown.
pub async fn follow_plan(
    board: &mut PlanBoard,
    sub: &mut Subscription,
    cancel: &CancellationToken,
    mut render: impl FnMut(&PlanBoard),
) -> Result<usize> {
    let path = sub.path().to_string();
    let mut shown = 0;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            snapshot = sub.next() => {
                let Some(snapshot) = snapshot else {
                    warn!(%path, "plan subscription ended");
                    break;
                };
                board.apply_plan(&snapshot).context("received a malformed plan")?;
                render(board);
                shown += 1;
            }
        }
    }
    sub.stop();
    Ok(shown)
}

// -----------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------

pub fn render_board(board: &PlanBoard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plano da semana ({})", board.week());

    let Some(plan) = board.plan() else {
        let _ = writeln!(out, "{NO_PLAN_TEXT}");
        let _ = writeln!(out, "Run `reskill plan generate`.");
        return out;
    };

    if !plan.summary.is_empty() {
        let _ = writeln!(out, "{}", plan.summary);
    }
    let _ = writeln!(out);
    for task in &plan.tasks {
        let mark = if task.done { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {}  {}", task.id, task.title);
        if !task.description.is_empty() {
            let _ = writeln!(out, "        {}", task.description);
        }
        let _ = writeln!(out, "        Estimado: {} min", task.estimated_minutes);
    }

    let (done, total) = plan.progress();
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{done}/{total} concluídas, {} min no total",
        plan.total_minutes()
    );
    out
}
