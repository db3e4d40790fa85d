/// Format one ply for the move log. Odd plies carry the move number, even plies a dash,
/// regardless of which side the human plays.
pub fn format_move(san: &str, ply: u32) -> String {
    if ply % 2 == 1 {
        format!("{}. {}", ply.div_ceil(2), san)
    } else {
        format!("{san} -")
    }
}

/// Append-only move log, always scrolled to its end.
#[derive(Debug, Default, Clone)]
pub struct MoveHistory {
    text: String,
    scroll_top: usize,
}

impl MoveHistory {
    pub fn new() -> MoveHistory {
        MoveHistory::default()
    }

    pub fn record_move(&mut self, san: &str, ply: u32) {
        self.text.push_str(&format_move(san, ply));
        self.text.push(' ');
        self.scroll_to_end();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.scroll_top = 0;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    fn scroll_to_end(&mut self) {
        self.scroll_top = self.text.len();
    }

    /// Wrap the log at `width` columns and return the last `rows` lines, i.e. what a
    /// fixed-size region scrolled to `scroll_top` shows.
    pub fn visible_lines(&self, width: usize, rows: usize) -> Vec<String> {
        let width = width.max(1);
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();

        // keep "1. e4" together on a line
        let mut tokens = self.text[..self.scroll_top].split_whitespace().peekable();
        while let Some(token) = tokens.next() {
            let mut chunk = token.to_string();
            if token.ends_with('.') {
                if let Some(next) = tokens.next() {
                    chunk = format!("{token} {next}");
                }
            } else if tokens.peek() == Some(&"-") {
                tokens.next();
                chunk = format!("{token} -");
            }

            if !current.is_empty() && current.len() + 1 + chunk.len() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&chunk);
        }
        if !current.is_empty() {
            lines.push(current);
        }

        let skip = lines.len().saturating_sub(rows);
        lines.into_iter().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_only_on_odd_plies() {
        assert_eq!(format_move("e4", 1), "1. e4");
        assert_eq!(format_move("e5", 2), "e5 -");
        assert_eq!(format_move("Nf3", 3), "2. Nf3");
        assert_eq!(format_move("Nc6", 4), "Nc6 -");
        assert_eq!(format_move("Bb5", 5), "3. Bb5");
    }

    #[test]
    fn log_grows_with_trailing_spaces() {
        let mut history = MoveHistory::new();
        history.record_move("e4", 1);
        assert_eq!(history.text(), "1. e4 ");
        history.record_move("e5", 2);
        assert_eq!(history.text(), "1. e4 e5 - ");
        history.record_move("Nf3", 3);
        assert_eq!(history.text(), "1. e4 e5 - 2. Nf3 ");
        assert_eq!(history.scroll_top(), history.text().len());
    }

    #[test]
    fn clear_empties_the_log() {
        let mut history = MoveHistory::new();
        history.record_move("d4", 1);
        history.clear();
        assert_eq!(history.text(), "");
        assert_eq!(history.scroll_top(), 0);
        assert!(history.visible_lines(40, 5).is_empty());
    }

    #[test]
    fn shows_the_tail_of_a_long_log() {
        let mut history = MoveHistory::new();
        let moves = ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6"];
        for (i, san) in moves.iter().enumerate() {
            history.record_move(san, i as u32 + 1);
        }
        let lines = history.visible_lines(12, 2);
        assert_eq!(lines, vec!["3. Bb5 a6 -", "4. Ba4 Nf6 -"]);
    }
}
