use std::sync::mpsc::Sender;

use anyhow::Result;

use crate::{
    domain::{events::ChannelSignal, shell_state::ShellState},
    sync::transport::SignalSink,
};

use super::store_dispatcher::StoreResponse;

/// Everything the shell loop reacts to, from the terminal or from background
/// tasks.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Tick,
    QuitRequested,
    InputKey(KeyInput),
    /// Something happened on the live channel of transport session `session`.
    Channel {
        session: u64,
        signal: ChannelSignal,
    },
    Store(StoreResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>, ctrl: bool) -> Self {
        Self {
            key: key.into(),
            ctrl,
        }
    }
}

impl SignalSink for Sender<AppEvent> {
    fn deliver(&self, session: u64, signal: ChannelSignal) -> bool {
        self.send(AppEvent::Channel { session, signal }).is_ok()
    }
}

pub trait AppEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>>;
}

pub trait ShellOrchestrator {
    fn state(&self) -> &ShellState;
    fn state_mut(&mut self) -> &mut ShellState;
    /// Acquires the live session and issues the first loads.
    fn start(&mut self) -> Result<()>;
    fn handle_event(&mut self, event: AppEvent) -> Result<()>;
}
