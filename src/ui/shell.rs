use std::time::Instant;

use anyhow::Result;

use crate::{
    domain::shell_state::ShellState,
    usecases::{
        context::AppContext,
        contracts::{AppEventSource, ShellOrchestrator},
    },
};

use super::{terminal::TerminalSession, view};

pub fn start(
    context: &AppContext,
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
) -> Result<()> {
    tracing::info!(
        log_level = %context.config.logging.level,
        api_base_url = %context.config.server.api_base_url,
        events_url = %context.config.server.events_url,
        "starting TUI shell"
    );

    let mut terminal = TerminalSession::new()?;
    orchestrator.start()?;

    run_loop(event_source, orchestrator, |state| {
        terminal.draw(|frame| view::render(frame, state, Instant::now()))
    })
}

/// Draws, waits for the next event, hands it over; until the state stops.
fn run_loop<F>(
    event_source: &mut dyn AppEventSource,
    orchestrator: &mut dyn ShellOrchestrator,
    mut draw: F,
) -> Result<()>
where
    F: FnMut(&mut ShellState) -> Result<()>,
{
    while orchestrator.state().is_running() {
        draw(orchestrator.state_mut())?;

        if let Some(event) = event_source.next_event()? {
            orchestrator.handle_event(event)?;
        }
    }

    Ok(())
}
