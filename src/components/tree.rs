use std::collections::HashSet;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::store::ItemId;
use crate::theme::ThemeColors;
use crate::tree::{FlatItem, TreeState};

/// Tree widget that renders the item tree with box-drawing characters.
pub struct TreeWidget<'a> {
    tree_state: &'a TreeState,
    theme: &'a ThemeColors,
    use_icons: bool,
    picked: HashSet<&'a ItemId>,
    placeholder: Option<(&'a str, bool)>,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(tree_state: &'a TreeState, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            tree_state,
            theme,
            use_icons,
            picked: HashSet::new(),
            placeholder: None,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Items picked up for a move, drawn with a marker.
    pub fn picked(mut self, picked: &'a [ItemId]) -> Self {
        self.picked = picked.iter().collect();
        self
    }

    /// Text shown instead of rows (loading, failure, empty tree).
    pub fn placeholder(mut self, text: &'a str, is_error: bool) -> Self {
        self.placeholder = Some((text, is_error));
        self
    }

    /// Build the indentation prefix from the sibling flags of each ancestor.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();
        for d in 0..item.depth {
            // Nearest row above at depth d is this item's ancestor.
            let ancestor_is_last = items[..item_index]
                .iter()
                .rev()
                .take_while(|row| row.depth >= d)
                .find(|row| row.depth == d)
                .map(|row| row.is_last_sibling)
                .unwrap_or(true);
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix
    }

    fn connector(item: &FlatItem) -> &'static str {
        if item.is_last_sibling {
            "└─ "
        } else {
            "├─ "
        }
    }

    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        match (self.use_icons, item.is_container, item.is_expanded) {
            (true, true, true) => "\u{f07c} ",
            (true, true, false) => "\u{f07b} ",
            (true, false, _) => "\u{f15b} ",
            (false, true, true) => "[-] ",
            (false, true, false) => "[+] ",
            (false, false, _) => "    ",
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner_area.height == 0 || inner_area.width == 0 {
            return;
        }

        if let Some((text, is_error)) = self.placeholder {
            let fg = if is_error {
                self.theme.error_fg
            } else {
                self.theme.dim_fg
            };
            let line = Line::from(Span::styled(
                text,
                Style::default().fg(fg).add_modifier(Modifier::ITALIC),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let items = &self.tree_state.flat_items;
        let selected = self.tree_state.selected_index;
        let visible = items
            .iter()
            .enumerate()
            .skip(self.tree_state.scroll_offset)
            .take(inner_area.height as usize);

        for (row, (idx, item)) in visible.enumerate() {
            let y = inner_area.y + row as u16;
            let is_multi = self.tree_state.multi_selected.contains(&item.id);
            let is_picked = self.picked.contains(&item.id);

            let style = if idx == selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if is_multi {
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD)
            } else if is_picked {
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::ITALIC)
            } else if item.is_container {
                Style::default()
                    .fg(self.theme.tree_dir_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.tree_file_fg)
            };

            let marker = match (is_multi, is_picked) {
                (true, _) => "● ",
                (false, true) => "↕ ",
                _ => "",
            };
            let content = format!(
                "{}{}{}{}{}",
                Self::build_prefix(item, items, idx),
                Self::connector(item),
                marker,
                self.item_indicator(item),
                item.label
            );
            let tree_style = Style::default().fg(self.theme.border_fg);
            let split = content.len() - item.label.len();
            let line = Line::from(vec![
                Span::styled(content[..split].to_string(), tree_style),
                Span::styled(item.label.clone(), style),
            ]);
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::dark_theme;

    fn flat(id: &str, depth: usize, is_container: bool, is_last: bool) -> FlatItem {
        FlatItem {
            id: id.to_string(),
            label: format!("{}-label", id),
            is_container,
            depth,
            is_expanded: is_container,
            is_last_sibling: is_last,
        }
    }

    fn render_lines(widget: TreeWidget<'_>, width: u16, height: u16) -> Vec<String> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    fn sample_state() -> TreeState {
        TreeState {
            flat_items: vec![
                flat("docs", 0, true, false),
                flat("a", 1, false, false),
                flat("b", 1, false, true),
                flat("z", 0, false, true),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn renders_connectors_and_indentation() {
        let state = sample_state();
        let theme = dark_theme();
        let lines = render_lines(TreeWidget::new(&state, &theme, false), 30, 4);
        assert_eq!(lines[0], "├─ [-] docs-label");
        assert_eq!(lines[1], "│  ├─     a-label");
        assert_eq!(lines[2], "│  └─     b-label");
        assert_eq!(lines[3], "└─     z-label");
    }

    #[test]
    fn marks_multi_selected_and_picked_rows() {
        let mut state = sample_state();
        state.multi_selected.insert("a".to_string());
        let picked = vec!["b".to_string()];
        let theme = dark_theme();
        let lines = render_lines(
            TreeWidget::new(&state, &theme, false).picked(&picked),
            30,
            4,
        );
        assert!(lines[1].contains("● "));
        assert!(lines[2].contains("↕ "));
    }

    #[test]
    fn selected_row_uses_selection_colors() {
        let mut state = sample_state();
        state.selected_index = 3;
        let theme = dark_theme();
        let area = Rect::new(0, 0, 30, 4);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&state, &theme, false).render(area, &mut buf);
        // Label starts after "└─ " and the four-column indicator.
        let cell = buf.cell((7, 3)).unwrap();
        assert_eq!(cell.bg, theme.tree_selected_bg);
    }

    #[test]
    fn scroll_offset_skips_rows() {
        let mut state = sample_state();
        state.scroll_offset = 2;
        let theme = dark_theme();
        let lines = render_lines(TreeWidget::new(&state, &theme, false), 30, 2);
        assert_eq!(lines[0], "│  └─     b-label");
        assert_eq!(lines[1], "└─     z-label");
    }

    #[test]
    fn placeholder_replaces_rows() {
        let state = sample_state();
        let theme = dark_theme();
        let lines = render_lines(
            TreeWidget::new(&state, &theme, false).placeholder("Loading…", false),
            30,
            2,
        );
        assert_eq!(lines[0], "Loading…");
        assert_eq!(lines[1], "");
    }

    #[test]
    fn zero_area_does_not_panic() {
        let state = sample_state();
        let theme = dark_theme();
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&state, &theme, true).render(area, &mut buf);
    }
}
