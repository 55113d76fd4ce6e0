use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};
use tui::{
    backend::Backend,
    style::Color,
    text::Spans,
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::auth::{FALLBACK_USER, Session, SessionProvider, SessionSubscription};
use crate::config::Config;
use crate::db::RecordStore;
use crate::error::DashboardError;
use crate::export::{InvoiceDocument, InvoiceExporter};
use crate::models::{Client, Project};
use crate::sync::{FetchSequencer, FetchTicket};
use crate::ui::{
    Header,
    client_dashboard::{self, ClientDashboardAction, ClientDashboardState, render_client_dashboard},
    client_wizard::{self, ClientWizardAction, ClientWizardState, render_client_wizard},
    components::render_popup,
    login::{self, LoginAction, LoginState, render_login},
    overview::{self, OverviewAction, OverviewState, render_overview},
    project_wizard::{self, ProjectWizardAction, ProjectWizardState, render_project_wizard},
};

// Represents the current screen in the app
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppScreen {
    Login,
    Overview,
    ClientDashboard(i64), // Contains client_id
    ClientWizard,
    ProjectWizard,
}

/// Display settings taken from [`Config`].
pub struct Settings {
    pub studio_name: String,
    pub currency_symbol: String,
    pub export_dir: PathBuf,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            studio_name: config.studio_name.clone(),
            currency_symbol: config.currency_symbol.clone(),
            export_dir: PathBuf::from(&config.export_dir),
        }
    }
}

/// Modal message, dismissed by any key.
pub struct Alert {
    pub title: String,
    pub message: String,
    color: Color,
}

/// Results of background reads, sent back to the UI loop.
enum Loaded {
    Overview {
        ticket: FetchTicket,
        result: Result<(Vec<Client>, Vec<Project>), DashboardError>,
    },
    Client {
        ticket: FetchTicket,
        client_id: i64,
        result: Result<(Client, Vec<Project>), DashboardError>,
    },
    SignIn {
        result: Result<Session, DashboardError>,
    },
}

// Main application state
pub struct AppState {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn SessionProvider>,
    subscription: Option<SessionSubscription>,
    session: Option<Session>,
    settings: Settings,
    screen: AppScreen,
    login: LoginState,
    overview: OverviewState,
    client_dashboard: Option<ClientDashboardState>,
    client_wizard: Option<ClientWizardState>,
    project_wizard: Option<ProjectWizardState>,
    alert: Option<Alert>,
    overview_seq: FetchSequencer,
    client_seq: FetchSequencer,
    loaded_tx: UnboundedSender<Loaded>,
    loaded_rx: UnboundedReceiver<Loaded>,
    should_quit: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, auth: Arc<dyn SessionProvider>, settings: Settings) -> Self {
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
        let subscription = auth.subscribe();

        let mut app = Self {
            store,
            auth,
            subscription: Some(subscription),
            session: None,
            settings,
            screen: AppScreen::Login,
            login: LoginState::new(),
            overview: OverviewState::new(),
            client_dashboard: None,
            client_wizard: None,
            project_wizard: None,
            alert: None,
            overview_seq: FetchSequencer::new(),
            client_seq: FetchSequencer::new(),
            loaded_tx,
            loaded_rx,
            should_quit: false,
        };

        // A session the provider already holds skips the login screen.
        if let Some(existing) = app.auth.current_session() {
            info!(user = existing.display_email(), "resuming session");
            app.apply_session(Some(existing));
        }
        app
    }

    #[cfg(test)]
    pub fn screen(&self) -> AppScreen {
        self.screen
    }

    #[cfg(test)]
    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Pick up session changes and expiry. Without a valid session every
    /// screen falls back to login.
    pub fn poll_session(&mut self) {
        let changed = self.subscription.as_mut().and_then(|s| s.poll());
        if let Some(session) = changed {
            self.apply_session(session);
        }

        let expired = self.session.as_ref().is_some_and(|s| !s.is_valid(Utc::now()));
        if expired {
            info!("session expired");
            self.apply_session(None);
        }
    }

    fn apply_session(&mut self, session: Option<Session>) {
        match session.filter(|s| s.is_valid(Utc::now())) {
            Some(session) => {
                let was_signed_in = self.session.is_some();
                self.session = Some(session);
                if !was_signed_in || self.screen == AppScreen::Login {
                    self.login = LoginState::new();
                    self.screen = AppScreen::Overview;
                    self.spawn_overview_load();
                }
            }
            None => {
                if self.session.take().is_some() {
                    debug!("dropping signed-in state");
                }
                self.overview_seq.cancel();
                self.client_seq.cancel();
                self.overview = OverviewState::new();
                self.client_dashboard = None;
                self.client_wizard = None;
                self.project_wizard = None;
                self.login.submitting = false;
                self.screen = AppScreen::Login;
            }
        }
    }

    /// Release the session subscription. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    fn spawn_overview_load(&mut self) {
        let ticket = self.overview_seq.begin();
        let store = Arc::clone(&self.store);
        let tx = self.loaded_tx.clone();
        debug!(?ticket, "loading studio overview");

        tokio::spawn(async move {
            let result = tokio::try_join!(store.list_clients(), store.list_projects());
            if tx.send(Loaded::Overview { ticket, result }).is_err() {
                debug!("overview loaded after the ui closed");
            }
        });
    }

    fn spawn_client_load(&mut self, client_id: i64) {
        let ticket = self.client_seq.begin();
        let store = Arc::clone(&self.store);
        let tx = self.loaded_tx.clone();
        debug!(?ticket, client_id, "loading client dashboard");

        tokio::spawn(async move {
            let result = tokio::try_join!(
                store.get_client(client_id),
                store.list_client_projects(client_id)
            );
            if tx.send(Loaded::Client { ticket, client_id, result }).is_err() {
                debug!("client loaded after the ui closed");
            }
        });
    }

    /// Sign in off the UI loop so the login screen can show progress.
    fn spawn_sign_in(&mut self, email: String, password: String) {
        let auth = Arc::clone(&self.auth);
        let tx = self.loaded_tx.clone();
        debug!(email = %email, "signing in");

        tokio::spawn(async move {
            let result = auth.sign_in(&email, &password).await;
            if tx.send(Loaded::SignIn { result }).is_err() {
                debug!("sign-in finished after the ui closed");
            }
        });
    }

    /// Apply every background result that has arrived so far.
    pub fn drain_loaded(&mut self) {
        while let Ok(loaded) = self.loaded_rx.try_recv() {
            self.apply_loaded(loaded);
        }
    }

    fn apply_loaded(&mut self, loaded: Loaded) {
        match loaded {
            Loaded::Overview { ticket, result } => {
                let Some(result) = self.overview_seq.accept(ticket, result) else {
                    return;
                };
                match result {
                    Ok((clients, projects)) => self.overview.set_data(clients, projects),
                    Err(e) => self.report("Could not load studio data", e),
                }
            }
            Loaded::Client { ticket, client_id, result } => {
                let Some(result) = self.client_seq.accept(ticket, result) else {
                    return;
                };
                match result {
                    Ok((client, projects)) => {
                        let same_client = self
                            .client_dashboard
                            .as_ref()
                            .is_some_and(|state| state.client().id == client_id);
                        if !same_client {
                            self.client_dashboard = Some(ClientDashboardState::new(client.clone()));
                        }
                        if let Some(state) = self.client_dashboard.as_mut() {
                            state.replace_data(client, projects);
                        }
                    }
                    Err(e) => self.report("Could not load client", e),
                }
            }
            Loaded::SignIn { result } => match result {
                Ok(_) => self.poll_session(),
                Err(e) => {
                    self.login.reset_password();
                    self.report("Login failed", e);
                }
            },
        }
    }

    /// Log a failure and show it. On-screen state is left as it was.
    fn report(&mut self, title: &str, err: DashboardError) {
        if err.is_validation() {
            warn!("{}: {}", title, err);
        } else {
            error!("{}: {}", title, err);
        }

        self.alert = Some(Alert {
            title: title.to_string(),
            message: err.to_string(),
            color: Color::LightRed,
        });
    }

    fn notify(&mut self, title: &str, message: String) {
        self.alert = Some(Alert {
            title: title.to_string(),
            message,
            color: Color::Green,
        });
    }

    pub async fn handle_key(&mut self, key: KeyCode) {
        if self.alert.take().is_some() {
            return;
        }

        match self.screen {
            AppScreen::Login => self.handle_login(key),
            AppScreen::Overview => self.handle_overview(key).await,
            AppScreen::ClientDashboard(client_id) => self.handle_client_dashboard(client_id, key).await,
            AppScreen::ClientWizard => self.handle_client_wizard(key).await,
            AppScreen::ProjectWizard => self.handle_project_wizard(key).await,
        }
    }

    fn handle_login(&mut self, key: KeyCode) {
        match login::handle_key(&mut self.login, key) {
            Some(LoginAction::Submit { email, password }) => self.spawn_sign_in(email, password),
            Some(LoginAction::Quit) => self.should_quit = true,
            None => {}
        }
    }

    async fn handle_overview(&mut self, key: KeyCode) {
        match overview::handle_key(&mut self.overview, key) {
            Some(OverviewAction::OpenClient(client_id)) => self.open_client(client_id),
            Some(OverviewAction::NewClient) => {
                self.client_wizard = Some(ClientWizardState::new());
                self.screen = AppScreen::ClientWizard;
            }
            Some(OverviewAction::Refresh) => self.spawn_overview_load(),
            Some(OverviewAction::Logout) => {
                self.auth.sign_out().await;
                self.poll_session();
            }
            Some(OverviewAction::Quit) => self.should_quit = true,
            None => {}
        }
    }

    fn open_client(&mut self, client_id: i64) {
        self.client_dashboard = self
            .overview
            .find_client(client_id)
            .cloned()
            .map(ClientDashboardState::new);
        self.screen = AppScreen::ClientDashboard(client_id);
        self.spawn_client_load(client_id);
    }

    fn back_to_overview(&mut self) {
        self.client_seq.cancel();
        self.client_dashboard = None;
        self.screen = AppScreen::Overview;
        self.spawn_overview_load();
    }

    async fn handle_client_dashboard(&mut self, client_id: i64, key: KeyCode) {
        let Some(state) = self.client_dashboard.as_mut() else {
            if key == KeyCode::Esc {
                self.back_to_overview();
            }
            return;
        };

        match client_dashboard::handle_key(state, key) {
            Some(ClientDashboardAction::Back) => self.back_to_overview(),
            Some(ClientDashboardAction::NewProject) => {
                self.project_wizard = Some(ProjectWizardState::new(client_id));
                self.screen = AppScreen::ProjectWizard;
            }
            Some(ClientDashboardAction::EditProject(project)) => {
                self.project_wizard = Some(ProjectWizardState::from_existing(&project));
                self.screen = AppScreen::ProjectWizard;
            }
            Some(ClientDashboardAction::DeleteProject(project_id)) => {
                match self.store.delete_project(project_id).await {
                    Ok(()) => self.spawn_client_load(client_id),
                    Err(e) => self.report("Could not delete project", e),
                }
            }
            Some(ClientDashboardAction::EditClient(client)) => {
                self.client_wizard = Some(ClientWizardState::from_existing(&client));
                self.screen = AppScreen::ClientWizard;
            }
            Some(ClientDashboardAction::DeleteClient(id)) => match self.store.delete_client(id).await {
                Ok(()) => self.back_to_overview(),
                Err(e) => self.report("Could not delete client", e),
            },
            Some(ClientDashboardAction::Export) => self.export_invoice(),
            Some(ClientDashboardAction::Refresh) => self.spawn_client_load(client_id),
            None => {}
        }
    }

    fn export_invoice(&mut self) {
        let Some(state) = self.client_dashboard.as_ref() else {
            return;
        };

        let result = InvoiceExporter::new(&self.settings.export_dir).and_then(|exporter| {
            exporter.export(&InvoiceDocument {
                studio_name: &self.settings.studio_name,
                currency_symbol: &self.settings.currency_symbol,
                generated_at: Local::now(),
                client: state.client(),
                projects: state.projects(),
            })
        });

        match result {
            Ok(exported) => {
                let message = match &exported.pdf_path {
                    Some(pdf) => format!("Saved {}", pdf.display()),
                    None => format!(
                        "No PDF (pandoc unavailable); saved Markdown to {}",
                        exported.markdown_path.display()
                    ),
                };
                self.notify("Invoice exported", message);
            }
            Err(e) => self.report("Could not export invoice", e),
        }
    }

    async fn handle_client_wizard(&mut self, key: KeyCode) {
        let Some(state) = self.client_wizard.as_mut() else {
            self.screen = AppScreen::Overview;
            return;
        };

        match client_wizard::handle_key(state, key) {
            Some(ClientWizardAction::Cancel) => {
                let client_id = state.client_id;
                self.client_wizard = None;
                self.screen = match client_id {
                    Some(id) => AppScreen::ClientDashboard(id),
                    None => AppScreen::Overview,
                };
            }
            Some(ClientWizardAction::Save { client_id: None, draft }) => {
                match self.store.insert_client(&draft).await {
                    Ok(_) => {
                        self.client_wizard = None;
                        self.back_to_overview();
                    }
                    Err(e) => self.report("Could not save client", e),
                }
            }
            Some(ClientWizardAction::Save { client_id: Some(id), draft }) => {
                match self.store.update_client(id, &draft).await {
                    Ok(_) => {
                        self.client_wizard = None;
                        self.screen = AppScreen::ClientDashboard(id);
                        self.spawn_client_load(id);
                    }
                    Err(e) => self.report("Could not save client", e),
                }
            }
            Some(ClientWizardAction::Invalid(e)) => self.report("Check the client form", e),
            None => {}
        }
    }

    async fn handle_project_wizard(&mut self, key: KeyCode) {
        let Some(state) = self.project_wizard.as_mut() else {
            self.screen = AppScreen::Overview;
            return;
        };

        match project_wizard::handle_key(state, key) {
            Some(ProjectWizardAction::Cancel) => {
                let client_id = state.client_id;
                self.project_wizard = None;
                self.screen = AppScreen::ClientDashboard(client_id);
            }
            Some(ProjectWizardAction::Save { client_id, project_id, draft }) => {
                let saved = match project_id {
                    Some(id) => self.store.update_project(id, &draft).await,
                    None => self.store.insert_project(client_id, &draft).await,
                };
                match saved {
                    Ok(_) => {
                        self.project_wizard = None;
                        self.screen = AppScreen::ClientDashboard(client_id);
                        self.spawn_client_load(client_id);
                    }
                    Err(e) => self.report("Could not save project", e),
                }
            }
            Some(ProjectWizardAction::Invalid(e)) => self.report("Check the project form", e),
            None => {}
        }
    }

    pub fn render<B: Backend>(&mut self, f: &mut Frame<B>) {
        let user = self
            .session
            .as_ref()
            .map(|s| s.display_email())
            .unwrap_or(FALLBACK_USER);
        let header = Header {
            studio_name: &self.settings.studio_name,
            user,
            currency: &self.settings.currency_symbol,
        };

        match self.screen {
            AppScreen::Login => render_login(f, &self.login, &self.settings.studio_name),
            AppScreen::Overview => render_overview(f, &mut self.overview, &header),
            AppScreen::ClientDashboard(_) => match self.client_dashboard.as_mut() {
                Some(state) => render_client_dashboard(f, state, &header, Utc::now()),
                None => {
                    let loading = Paragraph::new("Loading client…")
                        .block(Block::default().title("Client Dashboard").borders(Borders::ALL));
                    f.render_widget(loading, f.size());
                }
            },
            AppScreen::ClientWizard => {
                if let Some(state) = &self.client_wizard {
                    render_client_wizard(f, state);
                }
            }
            AppScreen::ProjectWizard => {
                if let Some(state) = &self.project_wizard {
                    render_project_wizard(f, state);
                }
            }
        }

        if let Some(alert) = &self.alert {
            render_popup(
                f,
                &alert.title,
                vec![
                    Spans::from(""),
                    Spans::from(alert.message.clone()),
                    Spans::from(""),
                    Spans::from("Press any key"),
                ],
                alert.color,
            );
        }
    }
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState) -> Result<()> {
    loop {
        app.poll_session();
        app.drain_loaded();

        terminal.draw(|f| app.render(f))?;

        if app.should_quit() {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code).await;
                }
            }
        }
    }

    app.shutdown();
    Ok(())
}
