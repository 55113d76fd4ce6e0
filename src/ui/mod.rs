pub mod client_dashboard;
pub mod client_wizard;
pub mod components;
pub mod login;
pub mod overview;
pub mod project_wizard;

use tui::{
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Top bar shared by the signed-in screens.
pub struct Header<'a> {
    pub studio_name: &'a str,
    pub user: &'a str,
    pub currency: &'a str,
}

impl Header<'_> {
    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, area: Rect, section: &str) {
        let line = Spans::from(vec![
            Span::styled(
                self.studio_name.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  ·  {}", section)),
        ]);
        let who = Paragraph::new(format!("Logged in as {}", self.user))
            .alignment(Alignment::Right)
            .style(Style::default().fg(Color::Gray));

        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(line), inner);
        frame.render_widget(who, inner);
    }
}
