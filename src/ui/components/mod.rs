use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Budget colour used for totals and bars.
pub const BUDGET: Color = Color::Yellow;
/// Received money.
pub const RECEIVED: Color = Color::Green;
/// Pending money.
pub const PENDING: Color = Color::LightRed;
/// Row background of unpaid work past its deadline.
pub const OVERDUE: Color = Color::Rgb(90, 20, 20);

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Modal box drawn over whatever is on screen.
pub fn render_popup<B: Backend>(frame: &mut Frame<B>, title: &str, lines: Vec<Spans>, color: Color) {
    let area = centered_rect(60, 30, frame.size());
    let popup = Paragraph::new(lines)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .style(Style::default().fg(color).bg(Color::Black))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

/// Yes/no confirmation in the style of the other popups.
pub fn render_confirmation<B: Backend>(frame: &mut Frame<B>, question: &str, detail: Option<&str>) {
    let mut lines = vec![Spans::from(""), Spans::from(question.to_string()), Spans::from("")];
    if let Some(detail) = detail {
        lines.push(Spans::from(detail.to_string()));
        lines.push(Spans::from(""));
    }
    lines.push(Spans::from("<Y> Yes  <N> No"));

    render_popup(frame, "Confirm Delete", lines, Color::White);
}

/// A labelled field list as used by the wizards.
pub fn render_fields<B: Backend>(
    frame: &mut Frame<B>,
    area: Rect,
    title: &str,
    fields: &[(&str, String)],
    current: usize,
    editing: bool,
) {
    let items: Vec<ListItem> = fields
        .iter()
        .enumerate()
        .map(|(i, (name, value))| {
            let content = if i == current && editing {
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), Style::default().fg(Color::Yellow)),
                    Span::styled(
                        format!("{}|", value),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                let style = if i == current {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };

                Spans::from(vec![
                    Span::styled(format!("{}: ", name), style),
                    Span::raw(value.clone()),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));

    frame.render_widget(form_list, area);
}

/// Horizontal bar: the filled part is the budget, its tail the pending share.
pub fn budget_bar(cells: usize, width_percent: f64, pending_percent: f64) -> Spans<'static> {
    let filled = ((cells as f64) * width_percent / 100.0).round() as usize;
    let filled = filled.min(cells);
    let pending = ((filled as f64) * pending_percent / 100.0).round() as usize;
    let pending = pending.min(filled);

    Spans::from(vec![
        Span::styled("█".repeat(filled - pending), Style::default().fg(BUDGET)),
        Span::styled("█".repeat(pending), Style::default().fg(PENDING)),
        Span::styled("░".repeat(cells - filled), Style::default().fg(Color::DarkGray)),
    ])
}

/// One-line help footer.
pub fn render_help<B: Backend>(frame: &mut Frame<B>, area: Rect, text: &str) {
    let help = Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help, area);
}
