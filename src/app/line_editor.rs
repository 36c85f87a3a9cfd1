/// Single-line input field (email, password, chat message). Stored as chars
/// so cursor movement is per visible character, not per byte.
#[derive(Clone, Debug, Default)]
pub struct FieldEditor {
    chars: Vec<char>,
    cursor: usize,
}

impl FieldEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        let ch = if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch };
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    /// Pasted text is flattened to one line; runs of whitespace collapse to a
    /// single space.
    pub fn insert_str(&mut self, text: &str) {
        let mut last_was_space = false;
        for ch in text.chars() {
            let ch = if ch.is_whitespace() { ' ' } else { ch };
            if ch == ' ' {
                if last_was_space {
                    continue;
                }
                last_was_space = true;
            } else {
                last_was_space = false;
            }
            self.chars.insert(self.cursor, ch);
            self.cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.chars.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_backspace_handle_unicode() {
        let mut editor = FieldEditor::new();
        editor.insert_str("ab");
        editor.insert_char('λ');
        assert_eq!(editor.text(), "abλ");
        assert_eq!(editor.cursor(), 3);
        editor.backspace();
        assert_eq!(editor.text(), "ab");
        assert_eq!(editor.cursor(), 2);
    }

    #[test]
    fn paste_flattens_to_one_line() {
        let mut editor = FieldEditor::new();
        editor.insert_str("a\nb\t  c");
        assert_eq!(editor.text(), "a b c");
    }

    #[test]
    fn cursor_moves_stay_in_bounds() {
        let mut editor = FieldEditor::new();
        editor.insert_str("hi");
        editor.move_left();
        editor.insert_char('!');
        assert_eq!(editor.text(), "h!i");
        editor.move_end();
        editor.move_right();
        assert_eq!(editor.cursor(), 3);
        editor.move_home();
        editor.delete_forward();
        assert_eq!(editor.text(), "!i");
    }
}
