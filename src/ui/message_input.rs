//! Compose box rendering.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::domain::{compose::ComposeDraft, shell_state::ActivePane};

use super::styles;

const PLACEHOLDER_TEXT: &str = "Press 'i' to write a message...";
const PROMPT_SYMBOL: &str = "> ";

pub fn render_message_input(
    frame: &mut Frame<'_>,
    area: Rect,
    input_state: &ComposeDraft,
    active_pane: ActivePane,
) {
    let is_focused = active_pane == ActivePane::Compose;

    let border_style = if is_focused {
        styles::active_panel_border_style()
    } else {
        styles::inactive_panel_border_style()
    };

    let paragraph = Paragraph::new(build_input_line(input_state, is_focused)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(paragraph, area);

    if is_focused {
        let cursor_x = area
            .x
            .saturating_add(1)
            .saturating_add(PROMPT_SYMBOL.len() as u16)
            .saturating_add(cursor_column(input_state));
        frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
    }
}

/// Terminal column of the cursor; wide characters take two cells.
fn cursor_column(input_state: &ComposeDraft) -> u16 {
    input_state.before_cursor().width().min(u16::MAX as usize) as u16
}

fn build_input_line(input_state: &ComposeDraft, is_focused: bool) -> Line<'static> {
    let prompt = Span::styled(PROMPT_SYMBOL.to_owned(), styles::input_prompt_style());

    if !is_focused && input_state.is_empty() {
        return Line::from(vec![
            prompt,
            Span::styled(PLACEHOLDER_TEXT.to_owned(), styles::input_placeholder_style()),
        ]);
    }

    Line::from(vec![
        prompt,
        Span::styled(input_state.text().to_owned(), styles::input_text_style()),
    ])
}
