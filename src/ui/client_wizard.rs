use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::error::DashboardError;
use crate::models::{Client, ClientDraft, ClientForm};
use crate::ui::components::{render_fields, render_help};

pub enum ClientWizardAction {
    Cancel,
    /// `client_id` is `None` when creating.
    Save {
        client_id: Option<i64>,
        draft: ClientDraft,
    },
    Invalid(DashboardError),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ClientField {
    Name,
    Email,
    Phone,
    LogoPath,
    Notes,
}

impl ClientField {
    const ORDER: [ClientField; 5] = [
        ClientField::Name,
        ClientField::Email,
        ClientField::Phone,
        ClientField::LogoPath,
        ClientField::Notes,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }
}

pub struct ClientWizardState {
    pub client_id: Option<i64>,
    pub form: ClientForm,
    pub current_field: ClientField,
    pub editing: bool,
}

impl ClientWizardState {
    pub fn new() -> Self {
        Self {
            client_id: None,
            form: ClientForm::default(),
            current_field: ClientField::Name,
            editing: false,
        }
    }

    pub fn from_existing(client: &Client) -> Self {
        Self {
            client_id: Some(client.id),
            form: ClientForm::from_client(client),
            current_field: ClientField::Name,
            editing: false,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        let i = (self.current_field.index() + 1) % ClientField::ORDER.len();
        self.current_field = ClientField::ORDER[i];
    }

    pub fn previous_field(&mut self) {
        let len = ClientField::ORDER.len();
        let i = (self.current_field.index() + len - 1) % len;
        self.current_field = ClientField::ORDER[i];
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field_value = match self.current_field {
            ClientField::Name => &mut self.form.name,
            ClientField::Email => &mut self.form.email,
            ClientField::Phone => &mut self.form.phone,
            ClientField::LogoPath => &mut self.form.logo_path,
            ClientField::Notes => &mut self.form.notes,
        };

        match key {
            KeyCode::Char(c) => field_value.push(c),
            KeyCode::Backspace => {
                field_value.pop();
            }
            _ => {}
        }
    }
}

impl Default for ClientWizardState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_client_wizard<B: Backend>(f: &mut Frame<B>, state: &ClientWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.client_id.is_none() {
        "New Client"
    } else {
        "Edit Client"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let fields = [
        ("Name *", state.form.name.clone()),
        ("Email", state.form.email.clone()),
        ("Phone", state.form.phone.clone()),
        ("Logo path", state.form.logo_path.clone()),
        ("Notes", state.form.notes.clone()),
    ];
    render_fields(
        f,
        chunks[1],
        "Client Details",
        &fields,
        state.current_field.index(),
        state.editing,
    );

    let help_text = if state.editing {
        "Enter - Save field | Esc - Cancel editing"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save client | Esc - Cancel"
    };
    render_help(f, chunks[2], help_text);
}

pub fn handle_key(state: &mut ClientWizardState, key: KeyCode) -> Option<ClientWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ClientWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down | KeyCode::Tab if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => {
            return Some(match state.form.validate() {
                Ok(draft) => ClientWizardAction::Save {
                    client_id: state.client_id,
                    draft,
                },
                Err(e) => ClientWizardAction::Invalid(e),
            });
        }
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(state: &mut ClientWizardState, text: &str) {
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn saving_a_new_client_yields_a_draft() {
        let mut state = ClientWizardState::new();
        type_into(&mut state, "Acme Films");
        handle_key(&mut state, KeyCode::Down);
        type_into(&mut state, "hi@acme.in");

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Save { client_id, draft }) => {
                assert_eq!(client_id, None);
                assert_eq!(draft.name, "Acme Films");
                assert_eq!(draft.email.as_deref(), Some("hi@acme.in"));
                assert_eq!(draft.phone, None);
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn blank_name_is_reported_not_saved() {
        let mut state = ClientWizardState::new();
        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ClientWizardAction::Invalid(e)) => assert!(e.is_validation()),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn s_is_text_while_editing() {
        let mut state = ClientWizardState::from_existing(&Client::fixture(4, "Bo"));
        handle_key(&mut state, KeyCode::Enter);
        assert!(handle_key(&mut state, KeyCode::Char('s')).is_none());
        assert_eq!(state.form.name, "Bos");
    }

    #[test]
    fn fields_wrap_around() {
        let mut state = ClientWizardState::new();
        state.previous_field();
        assert_eq!(state.current_field, ClientField::Notes);
        state.next_field();
        assert_eq!(state.current_field, ClientField::Name);
    }
}
