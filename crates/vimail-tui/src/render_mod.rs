use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::Paragraph,
};

use super::app_mod::App;

pub(crate) fn draw(frame: &mut ratatui::Frame, app: &App) {
    let screen = app.screen();
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::styled(
            screen.header,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new("─".repeat(area.width as usize))
            .style(Style::default().add_modifier(Modifier::DIM)),
        rows[1],
    );
    frame.render_widget(Paragraph::new(Text::from(screen.content)), rows[2]);
    frame.render_widget(
        Paragraph::new(screen.footer).style(Style::default().add_modifier(Modifier::DIM)),
        rows[3],
    );
}
