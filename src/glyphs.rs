use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::node::CheckState;
use crate::session::VisibleRow;

#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    pub loading: &'a str,
    pub checked: &'a str,
    pub unchecked: &'a str,
    pub mixed: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
            loading: "…",
            checked: "☑",
            unchecked: "☐",
            mixed: "◩",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
            loading: "~",
            checked: "[x]",
            unchecked: "[ ]",
            mixed: "[-]",
        }
    }
}

impl<'a> TreeGlyphs<'a> {
    pub const fn checkbox(&self, state: CheckState) -> &'a str {
        match state {
            CheckState::Checked => self.checked,
            CheckState::Unchecked => self.unchecked,
            CheckState::Mixed => self.mixed,
        }
    }

    const fn expander(&self, row: &VisibleRow) -> &'a str {
        if row.is_loading {
            self.loading
        } else if !row.has_children {
            self.leaf
        } else if row.is_expanded {
            self.expanded
        } else {
            self.collapsed
        }
    }
}

/// Rendering options for [`tree_label_line`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeLineOptions {
    pub draw_lines: bool,
    pub line_style: Style,
}

/// Builds the label line of one visible row: guides, expander, checkbox, name.
pub fn tree_label_line<'a>(
    row: &VisibleRow,
    state: CheckState,
    name: &'a str,
    glyphs: &TreeGlyphs<'a>,
    options: TreeLineOptions,
) -> Line<'a> {
    let mut spans = Vec::with_capacity(row.is_tail_stack.len() + 5);

    if options.draw_lines && row.level > 0 {
        let last_level = row.is_tail_stack.len().saturating_sub(1);
        for (l, is_last) in row.is_tail_stack.iter().copied().enumerate() {
            let part = if l == last_level {
                if is_last { glyphs.branch_last } else { glyphs.branch }
            } else if is_last {
                glyphs.indent
            } else {
                glyphs.vert
            };
            spans.push(Span::styled(part, options.line_style));
        }
    } else {
        for _ in 0..row.level {
            spans.push(Span::raw(glyphs.empty));
        }
    }

    spans.push(Span::raw(glyphs.expander(row)));
    spans.push(Span::raw(" "));
    spans.push(Span::raw(glyphs.checkbox(state)));
    spans.push(Span::raw(" "));
    spans.push(Span::raw(name));
    Line::from(spans)
}
