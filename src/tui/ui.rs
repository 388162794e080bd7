//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    layout::Position,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::memory::WORD_SIZE;
use crate::cpu::REFERENCE_COMMANDS;
use super::app::DebuggerApp;

/// Words per memory-map row.
const ROW_WORDS: u32 = 4;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(rows[0]);

    draw_registers(frame, columns[0], app);

    let middle = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);
    draw_memory(frame, middle[0], app);
    draw_stack(frame, middle[1], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(REFERENCE_COMMANDS.len() as u16 + 2), Constraint::Min(3)])
        .split(columns[2]);
    draw_commands(frame, right[0]);
    draw_reserved(frame, right[1], app);

    draw_status(frame, rows[1], app);
    draw_input(frame, rows[2], app);
}

/// Draw every bank, one header line per mode.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let mut lines = Vec::new();
    for bank in app.session.registers().banks() {
        lines.push(Line::from(Span::styled(
            format!("<{}>", bank.mode()),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for (reg, value) in bank.iter() {
            let style = if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(vec![
                Span::raw(format!("  {:>4}: ", reg.to_string())),
                Span::styled(format!("0x{:08X}", value), style),
            ]));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw rows of memory that contain at least one written word.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let mut row_starts: Vec<u32> = app
        .session
        .memory()
        .iter()
        .map(|(index, _)| index - index % ROW_WORDS)
        .collect();
    row_starts.dedup();

    let mem = app.session.memory();
    let items: Vec<ListItem> = row_starts
        .iter()
        .map(|&start| {
            let words: Vec<String> = (start..start.saturating_add(ROW_WORDS))
                .map(|i| format!("{:08X}", mem.read_word(i)))
                .collect();
            ListItem::new(format!("{:08X}: {}", start.wrapping_mul(WORD_SIZE), words.join(" ")))
        })
        .collect();

    let title = match mem.limit() {
        Some(words) => format!(" Memory Map ({} words) ", words),
        None => " Memory Map ".to_string(),
    };
    let list = List::new(items)
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw each non-empty stack, newest entry first.
fn draw_stack(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let stack = app.session.stack();
    let mut items = Vec::new();
    for mode in stack.active_modes() {
        items.push(ListItem::new(format!("<{}>", mode))
            .style(Style::default().fg(Color::Cyan)));
        for (i, entry) in stack.entries(mode).enumerate() {
            let marker = if i == 0 { "sp→" } else { "   " };
            items.push(ListItem::new(format!(
                "{} 0x{:08X}: 0x{:08X}",
                marker, entry.address, entry.value
            )));
        }
    }

    let list = List::new(items)
        .block(Block::default()
            .title(" Stack ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)));

    frame.render_widget(list, area);
}

/// Draw the reference command list.
fn draw_commands(frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = REFERENCE_COMMANDS
        .iter()
        .map(|cmd| {
            let style = if cmd.supported {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(cmd.syntax).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Command List ")
            .borders(Borders::ALL));

    frame.render_widget(list, area);
}

/// Draw the reserved queue, next line highlighted.
fn draw_reserved(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let items: Vec<ListItem> = app
        .session
        .reserved()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                ListItem::new(format!("▶ {}", line))
                    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(format!("  {}", line))
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Reserved ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw the input line.
fn draw_input(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let input = Paragraph::new(format!("> {}", app.input))
        .block(Block::default()
            .title(" Enter instruction (empty: step, q/Esc: quit, ↑↓: history) ")
            .borders(Borders::ALL));

    frame.render_widget(input, area);
    frame.set_cursor_position(Position::new(
        area.x + 3 + app.input.chars().count() as u16,
        area.y + 1,
    ));
}
