use std::time::Instant;

use chrono::{Local, TimeZone};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::domain::{
    conversation::Conversation,
    conversation_store::ConversationListUiState,
    ids::UserId,
    message_thread::ThreadUiState,
    presence::{Presence, PresenceTracker},
    shell_state::{ActivePane, ShellState},
};

use super::message_input::render_message_input;
use super::message_rendering::{
    build_thread_elements, element_to_list_item, message_index_to_element_index, Authors,
};
use super::styles;

const ONLINE_DOT: &str = " \u{25CF}";
const ELLIPSIS: &str = "...";

pub fn render(frame: &mut Frame<'_>, state: &mut ShellState, now: Instant) {
    let [content_area, status_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .areas(frame.area());

    let [list_area, thread_with_input_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .areas(content_area);

    // 1 border + 1 text + 1 border
    let [thread_area, input_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .areas(thread_with_input_area);

    let active_pane = state.active_pane();
    render_conversation_list(frame, list_area, state, active_pane);
    render_thread_panel(frame, thread_area, state, active_pane, now);
    render_message_input(frame, input_area, state.compose(), active_pane);

    frame.render_widget(Paragraph::new(status_line(state)), status_area);
}

fn border_style(is_active: bool) -> Style {
    if is_active {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    }
}

fn panel(title: String, is_active: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active))
}

fn render_conversation_list(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &ShellState,
    active_pane: ActivePane,
) {
    let is_active = active_pane == ActivePane::Conversations;
    let store = state.conversations();

    let placeholder = match store.ui_state() {
        ConversationListUiState::Loading if store.conversations().is_empty() => {
            Some("Loading conversations...")
        }
        ConversationListUiState::Empty => Some("No conversations yet. Press r to refresh."),
        ConversationListUiState::Error if store.conversations().is_empty() => {
            Some("Failed to load conversations. Press r to retry.")
        }
        _ => None,
    };

    if let Some(message) = placeholder {
        let widget = Paragraph::new(message).block(panel("Conversations".to_owned(), is_active));
        frame.render_widget(widget, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem<'static>> = store
        .conversations()
        .iter()
        .map(|conversation| {
            ListItem::new(conversation_row(
                conversation,
                state.local_user(),
                state.presence(),
                inner_width,
            ))
        })
        .collect();

    let title = match store.total_unread() {
        0 => format!("Conversations ({})", store.conversations().len()),
        unread => format!(
            "Conversations ({}, {unread} unread)",
            store.conversations().len()
        ),
    };
    let list = List::new(items)
        .block(panel(title, is_active))
        .highlight_style(styles::selection_style());

    let mut list_state = ListState::default();
    list_state.select(store.selected_index());
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn conversation_row(
    conversation: &Conversation,
    local_user: &UserId,
    presence: &PresenceTracker,
    width: usize,
) -> Line<'static> {
    let timestamp = conversation
        .last_message
        .as_ref()
        .map(|last| format_list_timestamp(last.sent_at_ms))
        .unwrap_or_else(|| "     ".to_owned());

    let preview = conversation
        .last_message
        .as_ref()
        .map(|last| {
            let text = normalize_preview(&last.content);
            if &last.sender_id == local_user {
                format!("You: {text}")
            } else {
                text
            }
        })
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "No messages yet".to_owned());

    let unread_badge = match conversation.unread_count {
        0 => String::new(),
        count => format!(" [{count}]"),
    };
    let online = presence.presence(conversation.counterpart_id()) == Some(Presence::Online);
    let online_dot = if online { ONLINE_DOT } else { "" };

    let title = conversation.title();
    // timestamp (5) + " | " (3) + title + " "
    let fixed = 5 + 3 + title.width() + 1;
    let suffix = unread_badge.width() + online_dot.width();
    let available = width.saturating_sub(fixed + suffix);
    let preview = truncate_to_width(&preview, available);
    let padding = available.saturating_sub(preview.width());

    let mut spans = vec![
        Span::styled(format!("{timestamp:>5}"), styles::timestamp_style()),
        Span::styled(" | ", styles::separator_style()),
        Span::styled(title, styles::conversation_name_style()),
        Span::raw(" "),
        Span::styled(preview, styles::conversation_preview_style()),
    ];
    if padding > 0 {
        spans.push(Span::raw(" ".repeat(padding)));
    }
    if !unread_badge.is_empty() {
        spans.push(Span::styled(unread_badge, styles::unread_count_style()));
    }
    if online {
        spans.push(Span::styled(
            online_dot.to_owned(),
            styles::online_indicator_style(),
        ));
    }

    Line::from(spans)
}

/// Cuts `text` so it fits in `max_width` terminal cells, ending in `...`
/// when something was dropped.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_owned();
    }

    let budget = max_width.saturating_sub(ELLIPSIS.len());
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > budget {
            break;
        }
        used += ch_width;
        out.push(ch);
    }

    if max_width >= ELLIPSIS.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

fn format_list_timestamp(timestamp_ms: i64) -> String {
    let datetime = match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => return "     ".to_owned(),
    };

    if datetime.date_naive() == Local::now().date_naive() {
        datetime.format("%H:%M").to_string()
    } else {
        datetime.format("%d.%m").to_string()
    }
}

fn normalize_preview(preview: &str) -> String {
    preview.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn render_thread_panel(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &mut ShellState,
    active_pane: ActivePane,
    now: Instant,
) {
    let is_active = active_pane == ActivePane::Messages;
    let title = thread_title(state);

    let typing = typing_line(state, now);
    let (list_area, typing_area) = match typing {
        Some(_) => {
            let [list_area, typing_area] = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1)])
                .areas(area);
            (list_area, Some(typing_area))
        }
        None => (area, None),
    };

    let placeholder = match state.thread().ui_state() {
        ThreadUiState::Empty => Some("Select a conversation to view messages"),
        ThreadUiState::Loading => Some("Loading messages..."),
        ThreadUiState::Error => Some("Failed to load messages. Press r to retry."),
        ThreadUiState::Ready if state.thread().messages().is_empty() => {
            Some("No messages yet. Press i to say hello.")
        }
        ThreadUiState::Ready => None,
    };

    if let Some(message) = placeholder {
        frame.render_widget(Paragraph::new(message).block(panel(title, is_active)), list_area);
    } else {
        let counterpart_name = counterpart_name(state);
        let authors = Authors {
            local_user: state.local_user(),
            counterpart_name: &counterpart_name,
        };
        let elements = build_thread_elements(state.thread().messages(), &authors);
        let items: Vec<ListItem<'static>> = elements.iter().map(element_to_list_item).collect();

        let viewport_height = list_area.height.saturating_sub(2) as usize;
        let element_index = state
            .thread()
            .selected_index()
            .and_then(|index| message_index_to_element_index(&elements, index));
        if let Some(index) = element_index {
            state
                .thread_mut()
                .update_scroll_offset(index, viewport_height);
        }

        let list = List::new(items)
            .block(panel(title, is_active))
            .highlight_style(styles::selection_style());

        let mut list_state = ListState::default();
        list_state.select(element_index);
        *list_state.offset_mut() = state.thread().scroll_offset();
        frame.render_stateful_widget(list, list_area, &mut list_state);
    }

    if let (Some(text), Some(typing_area)) = (typing, typing_area) {
        let line = Line::from(Span::styled(text, styles::typing_indicator_style()));
        frame.render_widget(Paragraph::new(line), typing_area);
    }
}

fn thread_title(state: &ShellState) -> String {
    let thread = state.thread();
    let Some(counterpart) = thread.counterpart() else {
        return "Messages".to_owned();
    };

    let presence = match state.presence().presence(counterpart) {
        Some(Presence::Online) => " (online)",
        Some(Presence::Offline) => " (offline)",
        None => "",
    };
    format!("Messages — {}{presence}", thread.title())
}

/// Display name of the open thread's counterpart, falling back to the
/// thread title when the conversation is not in the list (yet).
fn counterpart_name(state: &ShellState) -> String {
    state
        .thread()
        .counterpart()
        .and_then(|counterpart| state.conversations().find_by_counterpart(counterpart))
        .map(|conversation| conversation.counterpart.display_name.clone())
        .unwrap_or_else(|| state.thread().title().to_owned())
}

fn typing_line(state: &ShellState, now: Instant) -> Option<String> {
    let counterpart = state.thread().counterpart()?;
    state
        .presence()
        .is_typing(counterpart, now)
        .then(|| format!(" {} is typing...", counterpart_name(state)))
}

fn status_line(state: &ShellState) -> Line<'static> {
    let connection = state.connection_state();
    let hints = match state.active_pane() {
        ActivePane::Conversations => {
            "j/k: navigate | l/Enter: open | r: refresh | c: reconnect | q: quit"
        }
        ActivePane::Messages => {
            "j/k: navigate | i: compose | R: retry | d: discard | h/Esc: back | q: quit"
        }
        ActivePane::Compose => "Enter: send | Esc: stop typing",
    };

    let mut spans = vec![
        Span::raw("live: "),
        Span::styled(
            connection.as_label().to_owned(),
            styles::connection_style(connection),
        ),
        Span::raw(" | "),
    ];
    if let Some(notice) = state.notice() {
        spans.push(Span::styled(notice.to_owned(), styles::notice_style()));
        spans.push(Span::raw(" | "));
    }
    spans.push(Span::raw(hints));

    Line::from(spans)
}
