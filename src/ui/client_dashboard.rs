use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::filters::{self, ProjectFilters, UPCOMING_LIMIT, display_deadline};
use crate::finance::{self, format_money};
use crate::models::{Client, Project};
use crate::ui::components::{BUDGET, OVERDUE, PENDING, RECEIVED, render_confirmation, render_help};
use crate::ui::Header;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingDelete {
    Project(i64),
    Client,
}

// Represents the state of a single client's dashboard
pub struct ClientDashboardState {
    client: Client,
    projects: Vec<Project>,
    filters: ProjectFilters,
    list_state: ListState,
    confirm: Option<PendingDelete>,
    loading: bool,
}

pub enum ClientDashboardAction {
    Back,
    NewProject,
    EditProject(Project),
    DeleteProject(i64),
    EditClient(Client),
    DeleteClient(i64),
    Export,
    Refresh,
}

impl ClientDashboardState {
    /// A dashboard for `client` whose projects are still loading.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            projects: Vec::new(),
            filters: ProjectFilters::default(),
            list_state: ListState::default(),
            confirm: None,
            loading: true,
        }
    }

    /// Swap in freshly loaded data. Active filters are kept.
    pub fn replace_data(&mut self, client: Client, projects: Vec<Project>) {
        self.client = client;
        self.projects = projects;
        self.loading = false;
        self.reset_selection();
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn filters(&self) -> ProjectFilters {
        self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending_delete(&self) -> Option<PendingDelete> {
        self.confirm
    }

    pub fn visible_projects(&self) -> Vec<&Project> {
        filters::filter_projects(&self.projects, &self.filters)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        let visible = self.visible_projects();
        self.list_state.selected().and_then(|i| visible.get(i).copied())
    }

    fn set_filters(&mut self, filters: ProjectFilters) {
        self.filters = filters;
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        let len = self.visible_projects().len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) if i < len => Some(i),
            _ => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn next(&mut self) {
        let len = self.visible_projects().len();
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
        let len = self.visible_projects().len();
        if len == 0 {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }
}

pub fn render_client_dashboard<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut ClientDashboardState,
    header: &Header,
    now: DateTime<Utc>,
) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    header.render(frame, chunks[0], "Client Dashboard");

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(35),
                Constraint::Percentage(30),
                Constraint::Percentage(35),
            ]
            .as_ref(),
        )
        .split(chunks[1]);
    render_client_card(frame, state.client(), top[0]);
    render_money(frame, state, header.currency, top[1]);
    render_upcoming(frame, state, now, top[2]);

    let active = state.filters();
    let filter_line = Paragraph::new(Spans::from(vec![
        Span::raw("Work: "),
        Span::styled(active.work.label(), Style::default().fg(Color::Yellow)),
        Span::raw("   Payment: "),
        Span::styled(active.payment.label(), Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().title("Filters").borders(Borders::ALL));
    frame.render_widget(filter_line, chunks[2]);

    render_project_list(frame, state, header.currency, now, chunks[3]);

    let help = if state.selected_project().is_some() {
        "<N> New | <E> Edit | <D> Delete | <W>/<P> Filters | <C> Edit client | <X> Delete client | <I> Export | <Esc> Back"
    } else {
        "<N> New project | <W>/<P> Filters | <C> Edit client | <X> Delete client | <I> Export | <Esc> Back"
    };
    render_help(frame, chunks[4], help);

    match state.pending_delete() {
        Some(PendingDelete::Project(_)) => render_confirmation(
            frame,
            "Are you sure you want to delete this project?",
            None,
        ),
        Some(PendingDelete::Client) => render_confirmation(
            frame,
            "Delete this client and all their projects?",
            Some("This cannot be undone."),
        ),
        None => {}
    }
}

fn render_client_card<B: Backend>(frame: &mut Frame<B>, client: &Client, area: Rect) {
    let mut lines = vec![
        Spans::from(Span::styled(
            client.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from(client.contact_line().to_string()),
    ];
    if let Some(notes) = client.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(Spans::from(Span::styled(
            notes.to_string(),
            Style::default().fg(Color::Gray),
        )));
    }

    let card = Paragraph::new(lines).block(Block::default().title("Client").borders(Borders::ALL));
    frame.render_widget(card, area);
}

fn render_money<B: Backend>(
    frame: &mut Frame<B>,
    state: &ClientDashboardState,
    currency: &str,
    area: Rect,
) {
    // Totals always cover every project, whatever the filters show.
    let totals = finance::aggregate(state.projects());
    let lines = vec![
        Spans::from(vec![
            Span::raw("Total:    "),
            Span::styled(format_money(currency, totals.total), Style::default().fg(BUDGET)),
        ]),
        Spans::from(vec![
            Span::raw("Received: "),
            Span::styled(format_money(currency, totals.received), Style::default().fg(RECEIVED)),
        ]),
        Spans::from(vec![
            Span::raw("Pending:  "),
            Span::styled(format_money(currency, totals.pending), Style::default().fg(PENDING)),
        ]),
        Spans::from(format!("{} projects", state.projects().len())),
    ];

    let panel = Paragraph::new(lines).block(Block::default().title("Money").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_upcoming<B: Backend>(
    frame: &mut Frame<B>,
    state: &ClientDashboardState,
    now: DateTime<Utc>,
    area: Rect,
) {
    let upcoming = filters::upcoming_deadlines(state.projects(), now, UPCOMING_LIMIT);
    let lines: Vec<Spans> = if upcoming.is_empty() {
        vec![Spans::from("No upcoming unpaid deadlines.")]
    } else {
        upcoming
            .iter()
            .map(|p| {
                Spans::from(vec![
                    Span::styled(
                        display_deadline(p.deadline.as_deref()),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::raw(format!("  {}", p.name)),
                ])
            })
            .collect()
    };

    let panel = Paragraph::new(lines)
        .block(Block::default().title("Upcoming deadlines").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_project_list<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut ClientDashboardState,
    currency: &str,
    now: DateTime<Utc>,
    area: Rect,
) {
    let visible = state.visible_projects();
    let title = format!("Projects ({} of {})", visible.len(), state.projects.len());

    let items: Vec<ListItem> = if state.is_loading() {
        vec![ListItem::new("Loading…")]
    } else if visible.is_empty() {
        vec![ListItem::new("No projects match these filters.")]
    } else {
        visible
            .iter()
            .map(|project| {
                let a = finance::amounts(project);
                let work = project.work_status.map(|s| s.label()).unwrap_or_else(|| "-".to_string());
                let payment = project
                    .payment_status
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "-".to_string());

                let item = ListItem::new(vec![
                    Spans::from(vec![
                        Span::styled(project.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(format!(
                            "  {}  due {}",
                            project.project_type.as_deref().unwrap_or("-"),
                            display_deadline(project.deadline.as_deref())
                        )),
                    ]),
                    Spans::from(vec![
                        Span::raw(format!("Budget {}  ", format_money(currency, a.cost))),
                        Span::styled(
                            format!("Rec {}  ", format_money(currency, a.received)),
                            Style::default().fg(RECEIVED),
                        ),
                        Span::styled(
                            format!("Pend {}  ", format_money(currency, a.pending)),
                            Style::default().fg(PENDING),
                        ),
                        Span::raw(format!("[{} / {}]", work, payment)),
                    ]),
                ]);

                if filters::is_overdue(project, now) {
                    item.style(Style::default().bg(OVERDUE))
                } else {
                    item
                }
            })
            .collect()
    };

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    frame.render_stateful_widget(list, area, &mut state.list_state);
}

pub fn handle_key(state: &mut ClientDashboardState, key: KeyCode) -> Option<ClientDashboardAction> {
    if let Some(pending) = state.confirm {
        match key {
            KeyCode::Char('y') => {
                state.confirm = None;
                return Some(match pending {
                    PendingDelete::Project(id) => ClientDashboardAction::DeleteProject(id),
                    PendingDelete::Client => ClientDashboardAction::DeleteClient(state.client.id),
                });
            }
            KeyCode::Char('n') | KeyCode::Esc => state.confirm = None,
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Esc | KeyCode::Char('q') => return Some(ClientDashboardAction::Back),
        KeyCode::Char('n') => return Some(ClientDashboardAction::NewProject),
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(project) = state.selected_project() {
                return Some(ClientDashboardAction::EditProject(project.clone()));
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = state.selected_project().map(|p| p.id) {
                state.confirm = Some(PendingDelete::Project(id));
            }
        }
        KeyCode::Char('c') => return Some(ClientDashboardAction::EditClient(state.client.clone())),
        KeyCode::Char('x') => state.confirm = Some(PendingDelete::Client),
        KeyCode::Char('w') => {
            let filters = state.filters.cycle_work();
            state.set_filters(filters);
        }
        KeyCode::Char('p') => {
            let filters = state.filters.cycle_payment();
            state.set_filters(filters);
        }
        KeyCode::Char('i') => return Some(ClientDashboardAction::Export),
        KeyCode::Char('r') => return Some(ClientDashboardAction::Refresh),
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::StatusFilter;
    use crate::models::{PaymentStatus, WorkStatus};

    fn loaded() -> ClientDashboardState {
        let mut film = Project::fixture(1, 7, "Film");
        film.work_status = Some(WorkStatus::Editing);
        film.payment_status = Some(PaymentStatus::Paid);
        let mut reel = Project::fixture(2, 7, "Reel");
        reel.work_status = Some(WorkStatus::NotStarted);
        let mut album = Project::fixture(3, 7, "Album");
        album.work_status = Some(WorkStatus::Editing);

        let mut state = ClientDashboardState::new(Client::fixture(7, "Acme"));
        state.replace_data(Client::fixture(7, "Acme"), vec![film, reel, album]);
        state
    }

    #[test]
    fn work_filter_cycles_and_narrows() {
        let mut state = loaded();
        handle_key(&mut state, KeyCode::Char('w'));
        assert_eq!(state.filters().work, StatusFilter::Only(WorkStatus::NotStarted));
        assert_eq!(state.visible_projects().len(), 1);

        handle_key(&mut state, KeyCode::Char('w'));
        let names: Vec<&str> = state.visible_projects().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Film", "Album"]);
    }

    #[test]
    fn filters_combine_and_survive_reload() {
        let mut state = loaded();
        state.set_filters(ProjectFilters::new(
            StatusFilter::Only(WorkStatus::Editing),
            StatusFilter::Only(PaymentStatus::Unpaid),
        ));
        assert_eq!(state.visible_projects().len(), 1);
        assert_eq!(state.selected_project().unwrap().name, "Album");

        let projects = state.projects().to_vec();
        state.replace_data(Client::fixture(7, "Acme"), projects);
        assert_eq!(state.filters().payment, StatusFilter::Only(PaymentStatus::Unpaid));
        assert_eq!(state.visible_projects().len(), 1);
    }

    #[test]
    fn empty_filter_result_has_no_selection() {
        let mut state = loaded();
        state.set_filters(ProjectFilters::new(
            StatusFilter::Only(WorkStatus::Archived),
            StatusFilter::All,
        ));
        assert!(state.selected_project().is_none());
        assert!(handle_key(&mut state, KeyCode::Enter).is_none());
        handle_key(&mut state, KeyCode::Char('d'));
        assert_eq!(state.pending_delete(), None);
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut state = loaded();
        state.next();
        assert!(handle_key(&mut state, KeyCode::Char('d')).is_none());
        assert_eq!(state.pending_delete(), Some(PendingDelete::Project(2)));

        // other keys are swallowed while the popup is open
        assert!(handle_key(&mut state, KeyCode::Char('i')).is_none());
        match handle_key(&mut state, KeyCode::Char('y')) {
            Some(ClientDashboardAction::DeleteProject(id)) => assert_eq!(id, 2),
            _ => panic!("expected project delete"),
        }
        assert_eq!(state.pending_delete(), None);
    }

    #[test]
    fn declining_client_delete_does_nothing() {
        let mut state = loaded();
        handle_key(&mut state, KeyCode::Char('x'));
        assert_eq!(state.pending_delete(), Some(PendingDelete::Client));
        assert!(handle_key(&mut state, KeyCode::Char('n')).is_none());
        assert_eq!(state.pending_delete(), None);
    }
}
