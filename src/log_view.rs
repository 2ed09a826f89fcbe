use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scroll {
    /// Follow the newest entry.
    End,
    /// First visible line, set by the user.
    Offset(usize),
}

/// The rendered game log. Redraws only when the log content changes, so a
/// user reading history keeps their scroll position across polls.
#[derive(Debug)]
pub struct LogView {
    lines: Vec<String>,
    scroll: Scroll,
    redraws: u64,
}

impl Default for LogView {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            scroll: Scroll::End,
            redraws: 0,
        }
    }
}

impl LogView {
    /// Returns whether the view was redrawn.
    pub fn reconcile(&mut self, log: &[String]) -> bool {
        if self.lines.as_slice() == log {
            return false;
        }
        debug!(
            previous = self.lines.len(),
            current = log.len(),
            "log changed, redrawing"
        );
        self.lines = log.to_vec();
        self.scroll = Scroll::End;
        self.redraws += 1;
        true
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn is_following(&self) -> bool {
        self.scroll == Scroll::End
    }

    /// First visible line for a viewport of `height` rows.
    pub fn top_line(&self, height: usize) -> usize {
        let last_page = self.lines.len().saturating_sub(height);
        match self.scroll {
            Scroll::End => last_page,
            Scroll::Offset(offset) => offset.min(last_page),
        }
    }

    pub fn scroll_up(&mut self, rows: usize, height: usize) {
        let top = self.top_line(height);
        self.scroll = Scroll::Offset(top.saturating_sub(rows));
    }

    pub fn scroll_down(&mut self, rows: usize, height: usize) {
        let last_page = self.lines.len().saturating_sub(height);
        let top = self.top_line(height).saturating_add(rows);
        self.scroll = if top >= last_page {
            Scroll::End
        } else {
            Scroll::Offset(top)
        };
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll = Scroll::End;
    }
}
