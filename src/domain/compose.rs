//! Draft text of the compose box.

/// Upper bound on a message body when `[chat] max_message_chars` is not set.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 2_000;

/// Text being written in the compose box, with a byte-offset cursor that
/// always sits on a char boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeDraft {
    text: String,
    cursor: usize,
    max_chars: usize,
}

impl Default for ComposeDraft {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_MESSAGE_CHARS)
    }
}

impl ComposeDraft {
    pub fn with_limit(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            max_chars,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Everything left of the cursor, for cursor placement on screen.
    pub fn before_cursor(&self) -> &str {
        &self.text[..self.cursor]
    }

    /// What would be sent right now: the trimmed draft, or `None` when it is
    /// blank.
    pub fn submission(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Returns false when the draft is already at the limit.
    pub fn insert(&mut self, ch: char) -> bool {
        if self.text.chars().count() >= self.max_chars {
            return false;
        }
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    pub fn backspace(&mut self) {
        if let Some(len) = self.previous_char_len() {
            self.cursor -= len;
            self.text.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(len) = self.previous_char_len() {
            self.cursor -= len;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.text[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Puts the body of a rejected send back for editing. A draft the user
    /// already started is never overwritten; returns whether it was restored.
    pub fn restore_failed(&mut self, content: &str) -> bool {
        if !self.is_empty() {
            return false;
        }

        self.text = content.chars().take(self.max_chars).collect();
        self.cursor = self.text.len();
        true
    }

    fn previous_char_len(&self) -> Option<usize> {
        self.text[..self.cursor]
            .chars()
            .next_back()
            .map(char::len_utf8)
    }
}
