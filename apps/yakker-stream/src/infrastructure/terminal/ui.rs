//! Dashboard layout.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
};

use super::view::DashboardView;
use crate::application::services::RawSection;

const LABEL_WIDTH: u16 = 24;

/// Draw one frame.
pub fn render(f: &mut Frame, view: &DashboardView) {
    let chunks = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(f.area());

    render_header(f, chunks[0], view);
    render_core(f, chunks[1], view);
    render_raw(f, chunks[2], view);

    let footer = Paragraph::new("Press q to exit.").style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[3]);
}

fn render_header(f: &mut Frame, area: Rect, view: &DashboardView) {
    let state_color = match view.connection.as_str() {
        "CONNECTED" | "DEMO" => Color::Green,
        "DISCONNECTED" => Color::Red,
        _ => Color::Yellow,
    };
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Gray));

    let lines = vec![
        Line::from(vec![
            label("Connection : "),
            Span::styled(
                view.connection.clone(),
                Style::default().fg(state_color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![label("Last Event : "), Span::raw(view.last_event.clone())]),
        Line::from(vec![label("Last Update: "), Span::raw(view.last_update.clone())]),
    ];

    let block = Block::default()
        .title(" YAKKER METRICS ")
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_core(f: &mut Frame, area: Rect, view: &DashboardView) {
    let table = key_value_table(" CORE METRICS ", &view.core_rows);
    f.render_widget(table, area);
}

fn render_raw(f: &mut Frame, area: Rect, view: &DashboardView) {
    let block = Block::default()
        .title(format!(" RAW METRICS  (payload {}) ", view.raw_update))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(sections) = view.raw_sections.as_deref().filter(|s| !s.is_empty()) else {
        f.render_widget(Paragraph::new("Waiting for Yakker payload..."), inner);
        return;
    };

    let chunks = Layout::vertical(section_constraints(sections)).split(inner);
    for (section, chunk) in sections.iter().zip(chunks.iter()) {
        let title = format!(" [{}] ", section.title.to_uppercase());
        f.render_widget(key_value_table(&title, &section.rows), *chunk);
    }
}

fn section_constraints(sections: &[RawSection]) -> Vec<Constraint> {
    sections
        .iter()
        .map(|s| Constraint::Min(u16::try_from(s.rows.len()).unwrap_or(u16::MAX).saturating_add(2)))
        .collect()
}

fn key_value_table<'a>(title: &'a str, rows: &'a [(String, String)]) -> Table<'a> {
    let rows = rows
        .iter()
        .map(|(label, value)| Row::new(vec![label.as_str(), value.as_str()]));
    Table::new(rows, [Constraint::Length(LABEL_WIDTH), Constraint::Min(10)])
        .block(Block::default().title(title).borders(Borders::ALL))
}
