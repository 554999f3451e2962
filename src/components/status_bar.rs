use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " a:file A:dir r:ren x:pick v:drop p:save /:find q:quit ";

/// Status bar showing the server, load state, and counts, or a transient message.
pub struct StatusBarWidget<'a> {
    server: &'a str,
    load_status: &'a str,
    item_count: usize,
    unlinked_count: usize,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    filter: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(server: &'a str, load_status: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            server,
            load_status,
            item_count: 0,
            unlinked_count: 0,
            theme,
            status_message: None,
            is_error: false,
            filter: None,
        }
    }

    pub fn counts(mut self, items: usize, unlinked: usize) -> Self {
        self.item_count = items;
        self.unlinked_count = unlinked;
        self
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    /// Active search query, shown while typing or filtering.
    pub fn filter(mut self, query: &'a str) -> Self {
        self.filter = Some(query);
        self
    }

    fn status_style(&self) -> Style {
        let fg = match self.load_status {
            "loaded" => self.theme.success_fg,
            "failed" => self.theme.error_fg,
            "loading" => self.theme.warning_fg,
            _ => self.theme.dim_fg,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        text.chars().take(width).collect()
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;
        buf.set_style(area, Style::default().bg(self.theme.status_bg));

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let line = Line::from(Span::styled(fit(msg, width), style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.server),
                Style::default().fg(self.theme.status_fg),
            ),
            Span::styled(format!("[{}] ", self.load_status), self.status_style()),
            Span::styled(
                format!("{} items", self.item_count),
                Style::default().fg(self.theme.info_fg),
            ),
        ];
        if self.unlinked_count > 0 {
            spans.push(Span::styled(
                format!(" ({} unlinked)", self.unlinked_count),
                Style::default().fg(self.theme.warning_fg),
            ));
        }
        if let Some(query) = self.filter {
            spans.push(Span::styled(
                format!("  /{}", query),
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let room = width.saturating_sub(used);
        if room >= KEY_HINTS.len() {
            spans.push(Span::raw(" ".repeat(room - KEY_HINTS.len())));
            spans.push(Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
