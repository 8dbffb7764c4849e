//! Thread rendering logic.
//!
//! Handles visual formatting of messages including:
//! - Header line with time and author, content on the following lines
//! - Author grouping (consecutive messages from the same author show the name once)
//! - Date separators between messages from different days
//! - Delivery markers on messages written by the local user

use chrono::{Local, TimeZone};
use ratatui::{
    layout::Alignment,
    text::{Line, Span},
    widgets::ListItem,
};

use crate::domain::{
    ids::UserId,
    message::{DeliveryStatus, Message},
};

use super::styles;

const INDENT: &str = "      ";

/// Represents a visual element in the thread list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadElement {
    /// Date separator line (e.g., "——— 14 Feb 2026 ———").
    DateSeparator(String),
    Message {
        time: String,
        author: Option<String>,
        content: String,
        /// Only set for messages written by the local user.
        status: Option<DeliveryStatus>,
    },
}

/// Who wrote what, from the point of view of the local user.
pub struct Authors<'a> {
    pub local_user: &'a UserId,
    pub counterpart_name: &'a str,
}

impl Authors<'_> {
    fn name_of(&self, message: &Message) -> &str {
        if message.is_authored_by(self.local_user) {
            "You"
        } else {
            self.counterpart_name
        }
    }
}

pub fn build_thread_elements(messages: &[Message], authors: &Authors<'_>) -> Vec<ThreadElement> {
    let mut elements = Vec::new();
    let mut prev_date: Option<chrono::NaiveDate> = None;
    let mut prev_author: Option<&UserId> = None;

    for message in messages {
        let date = timestamp_to_date(message.created_at_ms);

        if prev_date != Some(date) {
            elements.push(ThreadElement::DateSeparator(format_date(date)));
            prev_author = None;
        }

        let author = (prev_author != Some(&message.sender_id))
            .then(|| authors.name_of(message).to_owned());
        let status = message
            .is_authored_by(authors.local_user)
            .then_some(message.status);

        elements.push(ThreadElement::Message {
            time: format_time(message.created_at_ms),
            author,
            content: message.content.clone(),
            status,
        });

        prev_date = Some(date);
        prev_author = Some(&message.sender_id);
    }

    elements
}

/// Maps a message index to its element index, skipping date separators.
pub fn message_index_to_element_index(
    elements: &[ThreadElement],
    message_index: usize,
) -> Option<usize> {
    elements
        .iter()
        .enumerate()
        .filter(|(_, element)| matches!(element, ThreadElement::Message { .. }))
        .nth(message_index)
        .map(|(index, _)| index)
}

pub fn element_to_list_item(element: &ThreadElement) -> ListItem<'static> {
    match element {
        ThreadElement::DateSeparator(date) => date_separator_item(date),
        ThreadElement::Message {
            time,
            author,
            content,
            status,
        } => message_item(time, author.as_deref(), content, *status),
    }
}

/// Short marker shown after an outgoing message.
pub fn delivery_marker(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Sending => "…",
        DeliveryStatus::Sent => "✓",
        DeliveryStatus::Delivered | DeliveryStatus::Read => "✓✓",
        DeliveryStatus::Failed => "! failed (R retry, d discard)",
    }
}

fn date_separator_item(date: &str) -> ListItem<'static> {
    let line = Line::from(vec![Span::styled(
        format!("——— {date} ———"),
        styles::date_separator_style(),
    )])
    .alignment(Alignment::Center);
    ListItem::new(vec![Line::default(), line, Line::default()])
}

fn message_item(
    time: &str,
    author: Option<&str>,
    content: &str,
    status: Option<DeliveryStatus>,
) -> ListItem<'static> {
    let mut lines = Vec::new();
    let time_span = Span::styled(format!("{time:>5} "), styles::message_time_style());
    let mut content_lines = content.lines();

    match author {
        Some(name) => {
            lines.push(Line::from(vec![
                time_span,
                Span::styled(format!("{name}:"), styles::message_sender_style()),
            ]));
            for text in content_lines {
                lines.push(indented(text));
            }
        }
        None => {
            let first = content_lines.next().unwrap_or_default();
            lines.push(Line::from(vec![
                time_span,
                Span::styled(first.to_owned(), styles::message_text_style()),
            ]));
            for text in content_lines {
                lines.push(indented(text));
            }
        }
    }

    if let Some(status) = status {
        let marker = Span::styled(
            format!(" {}", delivery_marker(status)),
            styles::delivery_status_style(status),
        );
        if let Some(last) = lines.last_mut() {
            last.spans.push(marker);
        }
    }

    ListItem::new(lines)
}

fn indented(text: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw(INDENT.to_owned()),
        Span::styled(text.to_owned(), styles::message_text_style()),
    ])
}

fn timestamp_to_date(timestamp_ms: i64) -> chrono::NaiveDate {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.date_naive(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.date_naive(),
        chrono::LocalResult::None => Local::now().date_naive(),
    }
}

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

fn format_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::None => "??:??".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_message;

    // UTC instants; grouping compares local dates so only the day gap matters.
    const FEB_14_2026_10AM: i64 = 1771059600000;
    const FEB_15_2026_1PM: i64 = 1771156800000;

    fn at(mut message: Message, created_at_ms: i64) -> Message {
        message.created_at_ms = created_at_ms;
        message
    }

    fn authors(local: &UserId) -> Authors<'_> {
        Authors {
            local_user: local,
            counterpart_name: "Bob",
        }
    }

    fn line_text(item: &ThreadElement) -> String {
        match item {
            ThreadElement::DateSeparator(date) => date.clone(),
            ThreadElement::Message { content, .. } => content.clone(),
        }
    }

    #[test]
    fn first_message_is_preceded_by_date_separator() {
        let local = UserId::new("u1");
        let messages = vec![at(sample_message("m1", "u2", "u1", "hi"), FEB_14_2026_10AM)];

        let elements = build_thread_elements(&messages, &authors(&local));

        assert_eq!(elements.len(), 2);
        assert!(matches!(elements[0], ThreadElement::DateSeparator(_)));
        assert_eq!(line_text(&elements[1]), "hi");
    }

    #[test]
    fn consecutive_messages_from_same_author_are_grouped() {
        let local = UserId::new("u1");
        let messages = vec![
            at(sample_message("m1", "u2", "u1", "one"), FEB_14_2026_10AM),
            at(sample_message("m2", "u2", "u1", "two"), FEB_14_2026_10AM + 60_000),
            at(sample_message("m3", "u1", "u2", "three"), FEB_14_2026_10AM + 120_000),
        ];

        let elements = build_thread_elements(&messages, &authors(&local));

        let shown: Vec<Option<String>> = elements
            .iter()
            .filter_map(|element| match element {
                ThreadElement::Message { author, .. } => Some(author.clone()),
                ThreadElement::DateSeparator(_) => None,
            })
            .collect();
        assert_eq!(
            shown,
            vec![Some("Bob".to_owned()), None, Some("You".to_owned())]
        );
    }

    #[test]
    fn only_outgoing_messages_carry_delivery_status() {
        let local = UserId::new("u1");
        let mut outgoing = at(sample_message("m2", "u1", "u2", "mine"), FEB_14_2026_10AM);
        outgoing.status = DeliveryStatus::Failed;
        let messages = vec![
            at(sample_message("m1", "u2", "u1", "theirs"), FEB_14_2026_10AM),
            outgoing,
        ];

        let elements = build_thread_elements(&messages, &authors(&local));

        assert!(matches!(
            elements[1],
            ThreadElement::Message { status: None, .. }
        ));
        assert!(matches!(
            elements[2],
            ThreadElement::Message {
                status: Some(DeliveryStatus::Failed),
                ..
            }
        ));
    }

    #[test]
    fn day_change_inserts_separator_and_resets_grouping() {
        let local = UserId::new("u1");
        let messages = vec![
            at(sample_message("m1", "u2", "u1", "one"), FEB_14_2026_10AM),
            at(sample_message("m2", "u2", "u1", "two"), FEB_15_2026_1PM),
        ];

        let elements = build_thread_elements(&messages, &authors(&local));

        assert_eq!(elements.len(), 4);
        assert!(matches!(
            &elements[3],
            ThreadElement::Message { author: Some(_), .. }
        ));
        assert_eq!(message_index_to_element_index(&elements, 1), Some(3));
        assert_eq!(message_index_to_element_index(&elements, 2), None);
    }

    #[test]
    fn failed_marker_hints_at_recovery_keys() {
        assert!(delivery_marker(DeliveryStatus::Failed).contains("retry"));
        assert_eq!(delivery_marker(DeliveryStatus::Sent), "✓");
    }
}
