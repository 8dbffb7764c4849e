//! Style definitions for the UI components.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{events::ConnectionState, message::DeliveryStatus};

// =============================================================================
// Panel styles
// =============================================================================

pub fn active_panel_border_style() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn inactive_panel_border_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn selection_style() -> Style {
    Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
}

// =============================================================================
// Conversation list styles
// =============================================================================

/// Style for the counterpart name (bold, bright).
pub fn conversation_name_style() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

/// Style for message preview text (dimmed).
pub fn conversation_preview_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Style for unread count badge (green).
pub fn unread_count_style() -> Style {
    Style::default().fg(Color::Green)
}

pub fn online_indicator_style() -> Style {
    Style::default().fg(Color::Green)
}

pub fn timestamp_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn separator_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

// =============================================================================
// Message list styles
// =============================================================================

pub fn message_sender_style() -> Style {
    Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub fn message_time_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn message_text_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn date_separator_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Colour of the delivery marker next to an outgoing message.
pub fn delivery_status_style(status: DeliveryStatus) -> Style {
    match status {
        DeliveryStatus::Sending => Style::default().fg(Color::DarkGray),
        DeliveryStatus::Sent | DeliveryStatus::Delivered => Style::default().fg(Color::Gray),
        DeliveryStatus::Read => Style::default().fg(Color::Cyan),
        DeliveryStatus::Failed => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    }
}

pub fn typing_indicator_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::ITALIC)
}

// =============================================================================
// Input and status bar styles
// =============================================================================

pub fn input_prompt_style() -> Style {
    Style::default().fg(Color::Cyan)
}

pub fn input_text_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn input_placeholder_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn connection_style(state: ConnectionState) -> Style {
    match state {
        ConnectionState::Connected => Style::default().fg(Color::Green),
        ConnectionState::Connecting => Style::default().fg(Color::Yellow),
        ConnectionState::Disconnected => Style::default().fg(Color::Red),
    }
}

pub fn notice_style() -> Style {
    Style::default().fg(Color::Yellow)
}
