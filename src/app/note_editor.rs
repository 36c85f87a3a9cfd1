/// Multi-line editor backing the journal composer and the inline note edit.
#[derive(Clone, Debug)]
pub struct NoteEditor {
    lines: Vec<Vec<char>>,
    row: usize,
    col: usize,
}

impl NoteEditor {
    pub fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
            row: 0,
            col: 0,
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut lines: Vec<Vec<char>> = text
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .split('\n')
            .map(|line| line.chars().collect())
            .collect();
        if lines.is_empty() {
            lines.push(Vec::new());
        }
        let row = lines.len() - 1;
        let col = lines[row].len();
        Self { lines, row, col }
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn line_strings(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| line.iter().collect())
            .collect()
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn clear(&mut self) {
        self.lines = vec![Vec::new()];
        self.row = 0;
        self.col = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            self.insert_newline();
            return;
        }
        self.lines[self.row].insert(self.col, ch);
        self.col += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        for ch in text.replace("\r\n", "\n").chars() {
            self.insert_char(ch);
        }
    }

    pub fn insert_newline(&mut self) {
        let rest = self.lines[self.row].split_off(self.col);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            self.lines[self.row].remove(self.col);
            return;
        }
        if self.row == 0 {
            return;
        }
        let current = self.lines.remove(self.row);
        self.row -= 1;
        self.col = self.lines[self.row].len();
        self.lines[self.row].extend(current);
    }

    pub fn delete_forward(&mut self) {
        if self.col < self.lines[self.row].len() {
            self.lines[self.row].remove(self.col);
            return;
        }
        if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].extend(next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.lines[self.row].len();
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.lines[self.row].len() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.lines[self.row].len());
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.lines[self.row].len());
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.lines[self.row].len();
    }
}

impl Default for NoteEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_splits_the_current_line() {
        let mut editor = NoteEditor::from_text("hello");
        editor.move_home();
        editor.move_right();
        editor.move_right();
        editor.insert_newline();
        assert_eq!(editor.text(), "he\nllo");
        assert_eq!(editor.cursor(), (1, 0));
    }

    #[test]
    fn backspace_at_line_start_joins_lines() {
        let mut editor = NoteEditor::from_text("he\nllo");
        editor.move_up();
        editor.move_down();
        editor.move_home();
        editor.backspace();
        assert_eq!(editor.text(), "hello");
    }

    #[test]
    fn from_text_places_cursor_at_end() {
        let editor = NoteEditor::from_text("a\nbc");
        assert_eq!(editor.cursor(), (1, 2));
        assert!(!editor.is_empty());
        assert!(NoteEditor::new().is_empty());
    }

    #[test]
    fn paste_preserves_newlines() {
        let mut editor = NoteEditor::new();
        editor.insert_str("dear diary\r\ntoday I...");
        assert_eq!(editor.text(), "dear diary\ntoday I...");
    }
}
