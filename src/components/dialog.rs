use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::theme::ThemeColors;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let w = width.min(area.width);
        let h = height.min(area.height);
        let x = area.x + area.width.saturating_sub(w) / 2;
        let y = area.y + area.height.saturating_sub(h) / 2;
        Rect::new(x, y, w, h)
    }

    fn frame(&self, title: &str, rect: Rect, border_fg: ratatui::style::Color, buf: &mut Buffer) -> Rect {
        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_fg))
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn render_hint(&self, hint: &str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let line = Line::from(Span::styled(
                hint,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
            buf.set_line(inner.x, inner.y + inner.height - 1, &line, inner.width);
        }
    }

    fn render_input(&self, title: &str, area: Rect, buf: &mut Buffer) {
        let rect = Self::centered_rect(50.min(area.width.saturating_sub(4)), 5, area);
        let inner = self.frame(title, rect, self.theme.dialog_border_fg, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.dialog_state.input;
        let cursor = self.dialog_state.cursor_position.min(input.len());
        let before = &input[..cursor];
        let (cursor_char, after) = match input[cursor..].chars().next() {
            Some(c) => input[cursor..].split_at(c.len_utf8()),
            None => (" ", ""),
        };

        // Keep the cursor in view by dropping characters from the left.
        let max_width = inner.width as usize;
        let before_chars = before.chars().count();
        let skip = before_chars.saturating_sub(max_width.saturating_sub(2));
        let before_display: String = before.chars().skip(skip).collect();

        let input_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.tree_fg)
            .fg(self.theme.dialog_bg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after, input_style),
        ]);
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);
        self.render_hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = (message.chars().count() as u16 + 6)
            .clamp(30, 70)
            .min(area.width.saturating_sub(4));
        let text_width = width.saturating_sub(4).max(1) as usize;
        let text_lines = message.chars().count().div_ceil(text_width).max(1) as u16;
        let rect = Self::centered_rect(width, text_lines + 4, area);
        let inner = self.frame("Error", rect, self.theme.error_fg, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let text_area = Rect::new(inner.x, inner.y, inner.width, inner.height.saturating_sub(1));
        Paragraph::new(message)
            .style(Style::default().fg(self.theme.error_fg))
            .wrap(Wrap { trim: true })
            .render(text_area, buf);
        self.render_hint("[Enter/Esc] Close", inner, buf);
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::NewFile => self.render_input("New File", area, buf),
            DialogKind::NewFolder => self.render_input("New Folder", area, buf),
            DialogKind::Rename { .. } => self.render_input("Rename", area, buf),
            DialogKind::Error { message } => self.render_error(message, area, buf),
        }
    }
}
