use std::{
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    usecases::contracts::{AppEvent, AppEventSource, KeyInput},
};

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
const UI_BACKGROUND_CHANNEL_CLOSED: &str = "UI_BACKGROUND_CHANNEL_CLOSED";

/// Merges terminal input with completions posted by background tasks.
/// Background events are drained first so they are never starved by typing.
pub struct CrosstermEventSource {
    background: Receiver<AppEvent>,
    background_closed: bool,
}

impl CrosstermEventSource {
    pub fn new(background: Receiver<AppEvent>) -> Self {
        Self {
            background,
            background_closed: false,
        }
    }

    fn next_background(&mut self) -> Option<AppEvent> {
        if self.background_closed {
            return None;
        }

        match self.background.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!(
                    code = UI_BACKGROUND_CHANNEL_CLOSED,
                    "background event channel closed"
                );
                self.background_closed = true;
                None
            }
        }
    }
}

impl AppEventSource for CrosstermEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        if let Some(event) = self.next_background() {
            return Ok(Some(event));
        }

        if !event::poll(EVENT_POLL_TIMEOUT)? {
            return Ok(Some(AppEvent::Tick));
        }

        match event::read()? {
            Event::Key(key) => Ok(map_key(key)),
            _ => Ok(None),
        }
    }
}

fn map_key(key: KeyEvent) -> Option<AppEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(AppEvent::QuitRequested);
    }

    let name = match key.code {
        KeyCode::Enter => "enter".to_owned(),
        KeyCode::Esc => "esc".to_owned(),
        KeyCode::Backspace => "backspace".to_owned(),
        KeyCode::Delete => "delete".to_owned(),
        KeyCode::Left => "left".to_owned(),
        KeyCode::Right => "right".to_owned(),
        KeyCode::Up => "up".to_owned(),
        KeyCode::Down => "down".to_owned(),
        KeyCode::Home => "home".to_owned(),
        KeyCode::End => "end".to_owned(),
        KeyCode::Char(ch) => ch.to_string(),
        _ => return None,
    };

    Some(AppEvent::InputKey(KeyInput::new(name, ctrl)))
}

#[cfg(test)]
pub struct MockEventSource {
    queue: std::collections::VecDeque<AppEvent>,
}

#[cfg(test)]
impl MockEventSource {
    pub fn from(events: Vec<AppEvent>) -> Self {
        Self {
            queue: events.into(),
        }
    }
}

#[cfg(test)]
impl AppEventSource for MockEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>> {
        Ok(self.queue.pop_front())
    }
}
