use std::collections::HashMap;

use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::finance::{self, ClientStats, Totals, format_money};
use crate::filters::filter_clients;
use crate::models::{Client, Project};
use crate::ui::components::{BUDGET, PENDING, RECEIVED, budget_bar, render_help};
use crate::ui::Header;

// Represents the state of the studio overview screen
pub struct OverviewState {
    clients: Vec<Client>,
    project_count: usize,
    stats: HashMap<i64, ClientStats>,
    totals: Totals,
    search: String,
    searching: bool,
    list_state: ListState,
    loading: bool,
}

pub enum OverviewAction {
    OpenClient(i64),
    NewClient,
    Refresh,
    Logout,
    Quit,
}

impl OverviewState {
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
            project_count: 0,
            stats: HashMap::new(),
            totals: Totals::default(),
            search: String::new(),
            searching: false,
            list_state: ListState::default(),
            loading: true,
        }
    }

    /// Replace the data behind the screen; the search text is kept.
    pub fn set_data(&mut self, clients: Vec<Client>, projects: Vec<Project>) {
        self.stats = finance::client_stats(&projects);
        self.totals = finance::studio_totals(&self.stats);
        self.project_count = projects.len();
        self.clients = clients;
        self.loading = false;
        self.reset_selection();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn visible_clients(&self) -> Vec<&Client> {
        filter_clients(&self.clients, &self.search)
    }

    pub fn find_client(&self, client_id: i64) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == client_id)
    }

    pub fn stats_for(&self, client_id: i64) -> ClientStats {
        self.stats.get(&client_id).copied().unwrap_or_default()
    }

    pub fn selected_client(&self) -> Option<&Client> {
        let visible = self.visible_clients();
        self.list_state.selected().and_then(|i| visible.get(i).copied())
    }

    fn reset_selection(&mut self) {
        let any = !self.visible_clients().is_empty();
        self.list_state.select(if any { Some(0) } else { None });
    }

    pub fn next(&mut self) {
        let len = self.visible_clients().len();
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.visible_clients().len();
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn edit_search(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) => self.search.push(c),
            KeyCode::Backspace => {
                self.search.pop();
            }
            _ => return,
        }
        self.reset_selection();
    }
}

impl Default for OverviewState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_overview<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut OverviewState,
    header: &Header,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(frame.size());

    header.render(frame, chunks[0], "Studio Overview");
    render_summary(frame, state, header.currency, chunks[1]);

    let search_style = if state.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search_text = if state.searching {
        format!("{}|", state.search)
    } else if state.search.is_empty() {
        "Press / to search clients…".to_string()
    } else {
        state.search.clone()
    };
    let search = Paragraph::new(search_text).block(
        Block::default()
            .title("Search client")
            .borders(Borders::ALL)
            .border_style(search_style),
    );
    frame.render_widget(search, chunks[2]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(chunks[3]);
    render_revenue(frame, state, header.currency, body[0]);
    render_selected(frame, state, header.currency, body[1]);

    let help = if state.searching {
        "Type to filter | Enter/Esc - Done"
    } else {
        "<Enter> Open client | <N> New client | </> Search | <R> Refresh | <L> Log out | <Q> Quit"
    };
    render_help(frame, chunks[4], help);
}

fn render_summary<B: Backend>(frame: &mut Frame<B>, state: &OverviewState, currency: &str, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let totals = state.totals();
    let money = Paragraph::new(vec![
        Spans::from(Span::styled(
            format_money(currency, totals.total),
            Style::default().fg(BUDGET).add_modifier(Modifier::BOLD),
        )),
        Spans::from(vec![
            Span::raw("Received: "),
            Span::styled(format_money(currency, totals.received), Style::default().fg(RECEIVED)),
            Span::raw(" · Pending: "),
            Span::styled(format_money(currency, totals.pending), Style::default().fg(PENDING)),
        ]),
    ])
    .block(Block::default().title("Total studio budget").borders(Borders::ALL));
    frame.render_widget(money, cols[0]);

    let counts = Paragraph::new(vec![
        Spans::from(format!("{} total clients", state.clients.len())),
        Spans::from(format!("{} total projects", state.project_count)),
    ])
    .block(Block::default().title("Clients & projects").borders(Borders::ALL));
    frame.render_widget(counts, cols[1]);
}

fn render_revenue<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut OverviewState,
    currency: &str,
    area: Rect,
) {
    let visible = state.visible_clients();
    let max_total = finance::max_client_total(visible.iter().copied(), &state.stats);
    let bar_cells = area.width.saturating_sub(4) as usize;

    let title = format!(
        "Revenue by client · {} client{}",
        visible.len(),
        if visible.len() == 1 { "" } else { "s" }
    );

    let items: Vec<ListItem> = if state.is_loading() {
        vec![ListItem::new("Loading…")]
    } else if visible.is_empty() {
        vec![ListItem::new("No clients match this search.")]
    } else {
        visible
            .iter()
            .map(|client| {
                let stats = state.stats_for(client.id);
                ListItem::new(vec![
                    Spans::from(vec![
                        Span::styled(client.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(format!(
                            "  {} project{}",
                            stats.projects,
                            if stats.projects == 1 { "" } else { "s" }
                        )),
                    ]),
                    budget_bar(
                        bar_cells,
                        finance::bar_width_percent(&stats, max_total),
                        finance::pending_share_percent(&stats),
                    ),
                    Spans::from(format!(
                        "Total: {} · Rec: {} · Pend: {}",
                        format_money(currency, stats.total),
                        format_money(currency, stats.received),
                        format_money(currency, stats.pending)
                    )),
                ])
            })
            .collect()
    };

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    frame.render_stateful_widget(list, area, &mut state.list_state);
}

fn render_selected<B: Backend>(frame: &mut Frame<B>, state: &OverviewState, currency: &str, area: Rect) {
    let lines = match state.selected_client() {
        Some(client) => {
            let stats = state.stats_for(client.id);
            vec![
                Spans::from(Span::styled(
                    client.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Spans::from(client.contact_line().to_string()),
                Spans::from(""),
                Spans::from(format!("Budget: {}", format_money(currency, stats.total))),
                Spans::from(Span::styled(
                    format!("Pending: {}", format_money(currency, stats.pending)),
                    Style::default().fg(PENDING),
                )),
            ]
        }
        None => vec![Spans::from("No clients yet. Press N to add one.")],
    };

    let panel = Paragraph::new(lines)
        .block(Block::default().title("Client dashboards").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

pub fn handle_key(state: &mut OverviewState, key: KeyCode) -> Option<OverviewAction> {
    if state.searching {
        match key {
            KeyCode::Enter | KeyCode::Esc => state.searching = false,
            KeyCode::Down => state.next(),
            KeyCode::Up => state.previous(),
            other => state.edit_search(other),
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(OverviewAction::Quit),
        KeyCode::Char('/') => state.searching = true,
        KeyCode::Char('n') => return Some(OverviewAction::NewClient),
        KeyCode::Char('r') => return Some(OverviewAction::Refresh),
        KeyCode::Char('l') => return Some(OverviewAction::Logout),
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Enter => {
            if let Some(client) = state.selected_client() {
                return Some(OverviewAction::OpenClient(client.id));
            }
        }
        _ => {}
    }

    None
}
