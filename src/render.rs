use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use q_grid::node::{ControlledBase, NodeKind};
use q_grid::palette::PALETTE;
use q_grid::params::format_angle;
use q_grid::Grid;

use crate::app::{App, Focus};

// ── Colors ─────────────────────────────────────────────────────────────────

const BLUE: Color = Color::Rgb(122, 162, 247);
const PURPLE: Color = Color::Rgb(187, 154, 247);
const GREEN: Color = Color::Rgb(158, 206, 106);
const ORANGE: Color = Color::Rgb(255, 158, 100);
const CYAN: Color = Color::Rgb(115, 218, 202);
const YELLOW: Color = Color::Rgb(224, 175, 104);
const DIM: Color = Color::Rgb(86, 95, 137);
const RED: Color = Color::Rgb(247, 118, 142);
const DARK_BLUE: Color = Color::Rgb(192, 202, 245);

// ── Layout constants ────────────────────────────────────────────────────────

const CELL_W: usize = 9;
const LABEL_W: usize = 7; // "q[N]  ──"
const GATE_NAME_W: usize = 5;

// ── Main render entry point ─────────────────────────────────────────────────

pub fn render(f: &mut Frame, app: &App) {
    let size = f.area();

    let ctrl_height = 3u16;
    let avail_h = size.height.saturating_sub(ctrl_height);

    // Left/Right split
    let qasm_w = (size.width / 3).max(30).min(size.width.saturating_sub(20));
    let left_w = size.width.saturating_sub(qasm_w);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(avail_h), Constraint::Length(ctrl_height)])
        .split(size);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(left_w), Constraint::Min(qasm_w)])
        .split(main_chunks[0]);

    render_circuit_panel(f, app, top_chunks[0]);
    render_qasm_panel(f, app, top_chunks[1]);
    render_controls_panel(f, app, main_chunks[1]);

    // Overlays
    if app.focus == Focus::InputAngle {
        render_angle_input_overlay(f, app);
    } else if app.show_help {
        render_help_overlay(f);
    }
}

// ── Circuit Panel ─────────────────────────────────────────────────────────────

fn render_circuit_panel(f: &mut Frame, app: &App, area: Rect) {
    let active = app.focus == Focus::Circuit;
    let border_color = if active { ORANGE } else { BLUE };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled("Circuit", Style::default().fg(ORANGE).add_modifier(Modifier::BOLD)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = build_circuit_lines(app, inner.width as usize)
        .into_iter()
        .map(Line::raw)
        .collect();
    lines.push(status_line(app));

    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn status_line(app: &App) -> Line<'static> {
    let (row, col) = app.editor.selection();
    let mut spans = vec![Span::styled(
        format!("  Column {col}, Qubit {row}"),
        Style::default().fg(DIM),
    )];

    if let Ok(node) = app.editor.grid().node(row, col) {
        let kind = app.editor.selected_kind();
        if kind != NodeKind::Empty {
            let mut desc = format!("  │  {kind}");
            if node.kind().is_rotatable() {
                desc.push_str(&format!(" θ={}", format_angle(node.theta())));
            }
            spans.push(Span::styled(desc, Style::default().fg(CYAN)));
        }
    }
    if !app.status_msg().is_empty() {
        spans.push(Span::styled(
            format!("  │  {}", app.status_msg()),
            Style::default().fg(RED),
        ));
    }
    Line::from(spans)
}

/// Top and bottom extents of every link drawn in a column.
fn column_spans(grid: &Grid, col: usize) -> Vec<(usize, usize)> {
    grid.column(col)
        .filter_map(|node| {
            let row = node.qubit_index();
            let lo = node.linked_rows().chain(Some(row)).min()?;
            let hi = node.linked_rows().chain(Some(row)).max()?;
            (lo != hi).then_some((lo, hi))
        })
        .collect()
}

fn build_circuit_lines(app: &App, width: usize) -> Vec<String> {
    let grid = app.editor.grid();
    let (cursor_row, cursor_col) = app.editor.selection();
    let mut lines: Vec<String> = Vec::new();

    let avail = width.saturating_sub(LABEL_W + 2);
    let max_cols = (avail / CELL_W).max(1);

    let start_col = if cursor_col >= max_cols {
        cursor_col - max_cols + 1
    } else {
        0
    };
    let end_col = (start_col + max_cols).min(grid.depth());

    // Column numbers header
    let mut col_hdr = " ".repeat(LABEL_W);
    for col in start_col..end_col {
        col_hdr.push_str(&pad_center(&format!("{col}"), CELL_W));
    }
    lines.push(col_hdr);

    let spans: Vec<Vec<(usize, usize)>> = (start_col..end_col)
        .map(|col| column_spans(grid, col))
        .collect();

    for row in 0..grid.qubit_count() {
        let mut top_line = " ".repeat(LABEL_W);
        let label = format!("q[{row}]");
        let mut mid_line = format!("{:<5}", label) + "──";
        let mut bot_line = " ".repeat(LABEL_W);

        for (offset, col) in (start_col..end_col).enumerate() {
            let kind = grid.effective_kind(row, col).unwrap_or_default();
            let vert_above = spans[offset].iter().any(|&(lo, hi)| lo < row && row <= hi);
            let vert_below = spans[offset].iter().any(|&(lo, hi)| lo <= row && row < hi);
            let info = CellInfo {
                kind,
                vert_above,
                vert_below,
            };

            let is_cursor = row == cursor_row && col == cursor_col && app.focus != Focus::Qasm;
            let (top, mid, bot) = render_cell(&info, is_cursor);
            top_line.push_str(&top);
            mid_line.push_str(&mid);
            bot_line.push_str(&bot);
        }

        lines.push(top_line);
        lines.push(mid_line);
        lines.push(bot_line);
    }

    lines
}

struct CellInfo {
    kind: NodeKind,
    vert_above: bool,
    vert_below: bool,
}

/// Kinds drawn as a single glyph on the wire instead of a box.
fn is_glyph(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Control
            | NodeKind::Trace
            | NodeKind::Swap
            | NodeKind::Toffoli
            | NodeKind::Controlled(
                ControlledBase::PauliX | ControlledBase::PauliZ | ControlledBase::Swap
            )
    )
}

fn render_cell(info: &CellInfo, is_cursor: bool) -> (String, String, String) {
    let empty = " ".repeat(CELL_W);
    let half = CELL_W / 2;
    let vert_row = " ".repeat(half) + "│" + &" ".repeat(CELL_W - half - 1);

    let dash_l = (CELL_W - 1) / 2;
    let dash_r = CELL_W - dash_l - 1;

    let passes = info.vert_above && info.vert_below;

    if is_cursor {
        let inner_w = CELL_W - 2;
        let dleft = (inner_w - 1) / 2;
        let dright = inner_w - dleft - 1;

        let top = format!("╔{}╗", "═".repeat(inner_w));
        let bot = format!("╚{}╝", "═".repeat(inner_w));

        let mid = if is_glyph(info.kind) {
            format!("║{}{}{}║", "─".repeat(dleft), info.kind.label(), "─".repeat(dright))
        } else if info.kind != NodeKind::Empty {
            let name = pad_center(info.kind.label(), GATE_NAME_W);
            format!("║┤{name}├║")
        } else if passes {
            format!("║{}┼{}║", "─".repeat(dleft), "─".repeat(dright))
        } else {
            format!("║{}║", "─".repeat(inner_w))
        };

        return (top, mid, bot);
    }

    if is_glyph(info.kind) {
        let top = if info.vert_above { vert_row.clone() } else { empty.clone() };
        let mid = "─".repeat(dash_l) + info.kind.label() + &"─".repeat(dash_r);
        let bot = if info.vert_below { vert_row } else { empty };
        return (top, mid, bot);
    }

    if info.kind != NodeKind::Empty {
        let margin = (CELL_W - GATE_NAME_W - 2) / 2;
        let rmargin = CELL_W - margin - GATE_NAME_W - 2;
        let name = pad_center(info.kind.label(), GATE_NAME_W);

        let edge_top = if info.vert_above { "┴" } else { "─" };
        let edge_bot = if info.vert_below { "┬" } else { "─" };
        let bar_l = (GATE_NAME_W - 1) / 2;
        let bar_r = GATE_NAME_W - bar_l - 1;

        let top = " ".repeat(margin)
            + "┌"
            + &"─".repeat(bar_l)
            + edge_top
            + &"─".repeat(bar_r)
            + "┐"
            + &" ".repeat(rmargin);
        let mid = "─".repeat(margin) + "┤" + &name + "├" + &"─".repeat(rmargin);
        let bot = " ".repeat(margin)
            + "└"
            + &"─".repeat(bar_l)
            + edge_bot
            + &"─".repeat(bar_r)
            + "┘"
            + &" ".repeat(rmargin);
        return (top, mid, bot);
    }

    if passes {
        let mid = "─".repeat(dash_l) + "┼" + &"─".repeat(dash_r);
        return (vert_row.clone(), mid, vert_row);
    }

    // Empty wire
    let top = if info.vert_above { vert_row.clone() } else { empty.clone() };
    let mid = "─".repeat(CELL_W);
    let bot = if info.vert_below { vert_row } else { empty };
    (top, mid, bot)
}

fn pad_center(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.chars().take(width).collect();
    }
    let total = width - len;
    let left = total / 2;
    let right = total - left;
    " ".repeat(left) + s + &" ".repeat(right)
}

// ── QASM Panel ────────────────────────────────────────────────────────────────

fn render_qasm_panel(f: &mut Frame, app: &App, area: Rect) {
    let active = app.focus == Focus::Qasm;
    let border_color = if active { ORANGE } else { PURPLE };
    let title = if active { "OpenQASM [SCROLL]" } else { "OpenQASM" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(title, Style::default().fg(ORANGE).add_modifier(Modifier::BOLD)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let p = Paragraph::new(app.editor.compile())
        .style(Style::default().fg(DARK_BLUE))
        .scroll((app.qasm_scroll, 0));
    f.render_widget(p, inner);
}

// ── Controls Panel ─────────────────────────────────────────────────────────────

fn render_controls_panel(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let help = match app.focus {
        Focus::Qasm => "OpenQASM:  ↑↓ Scroll  Tab Back to circuit  q Quit",
        Focus::InputAngle => "Angle:  Enter Apply  Esc Cancel",
        Focus::Circuit => {
            "↑↓←→ Move  x y z h s t i w m Gate  c Control  C 2nd ctrl  p Swap  [ ] Move ctrl  +/- Rotate  r Angle  Bksp Del  ? Help  Ctrl+S Save  q Quit"
        }
    };

    let p = Paragraph::new(Span::styled(help, Style::default().fg(YELLOW)));
    f.render_widget(p, inner);
}

// ── Help Overlay ──────────────────────────────────────────────────────────────

fn render_help_overlay(f: &mut Frame) {
    let area = overlay_rect(f.area(), 44, PALETTE.len() as u16 + 6);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ORANGE))
        .title(Span::styled("Gates", Style::default().fg(ORANGE).add_modifier(Modifier::BOLD)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = vec![Line::default()];
    for entry in PALETTE {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", entry.key), Style::default().fg(CYAN).add_modifier(Modifier::BOLD)),
            Span::styled(format!("{:<20}", entry.name), Style::default().fg(DARK_BLUE)),
            Span::styled(entry.kind.label(), Style::default().fg(DIM)),
            Span::styled(if entry.takes_angles() { "  θ" } else { "" }, Style::default().fg(DIM)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::styled("Same key again removes the gate", Style::default().fg(DIM)));
    lines.push(Line::styled("? or Esc closes", Style::default().fg(DIM)));

    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

// ── Angle Input Overlay ────────────────────────────────────────────────────────

fn render_angle_input_overlay(f: &mut Frame, app: &App) {
    let area = overlay_rect(f.area(), 40, 7);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ORANGE))
        .title(Span::styled("Set Angle", Style::default().fg(ORANGE).add_modifier(Modifier::BOLD)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::default(),
        Line::styled(format!("θ: {}_", app.angle_input), Style::default().fg(DARK_BLUE)),
        Line::default(),
        Line::styled("Examples: pi/2, 3*pi/4, 1.57", Style::default().fg(DIM)),
    ];

    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

// ── Overlay rect helper ────────────────────────────────────────────────────────

fn overlay_rect(screen: Rect, min_w: u16, min_h: u16) -> Rect {
    let w = min_w.min(screen.width.saturating_sub(4));
    let h = min_h.min(screen.height.saturating_sub(4));
    Rect {
        x: 2,
        y: 2,
        width: w,
        height: h,
    }
}
