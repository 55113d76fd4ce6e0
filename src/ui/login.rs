use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::components::{centered_rect, render_help};

pub enum LoginAction {
    Submit { email: String, password: String },
    Quit,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LoginField {
    Email,
    Password,
}

pub struct LoginState {
    pub email: String,
    pub password: String,
    pub current_field: LoginField,
    pub submitting: bool,
}

impl LoginState {
    pub fn new() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            current_field: LoginField::Email,
            submitting: false,
        }
    }

    pub fn switch_field(&mut self) {
        self.current_field = match self.current_field {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    /// Called after a failed attempt.
    pub fn reset_password(&mut self) {
        self.password.clear();
        self.submitting = false;
        self.current_field = LoginField::Password;
    }

    fn field_mut(&mut self) -> &mut String {
        match self.current_field {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }
}

impl Default for LoginState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_login<B: Backend>(f: &mut Frame<B>, state: &LoginState, studio_name: &str) {
    let area = centered_rect(50, 50, f.size());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(2),
            ]
            .as_ref(),
        )
        .split(area);

    let title = Paragraph::new(vec![
        Spans::from(Span::styled(
            studio_name.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from("Private admin login"),
    ])
    .style(Style::default().fg(Color::Cyan))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let masked = "•".repeat(state.password.chars().count());
    let inputs = [
        (LoginField::Email, "Email", state.email.clone(), chunks[1]),
        (LoginField::Password, "Password", masked, chunks[2]),
    ];
    for (field, label, value, chunk) in inputs {
        let focused = field == state.current_field;
        let style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let text = if focused { format!("{}|", value) } else { value };
        let input = Paragraph::new(text)
            .block(Block::default().title(label).borders(Borders::ALL).border_style(style));
        f.render_widget(input, chunk);
    }

    let help = if state.submitting {
        "Signing in…"
    } else {
        "Enter - Sign in | Tab - Switch field | Esc - Quit"
    };
    render_help(f, chunks[3], help);
}

pub fn handle_key(state: &mut LoginState, key: KeyCode) -> Option<LoginAction> {
    if state.submitting {
        return None;
    }

    match key {
        KeyCode::Esc => return Some(LoginAction::Quit),
        KeyCode::Tab | KeyCode::Up | KeyCode::Down => state.switch_field(),
        KeyCode::Enter => {
            if state.current_field == LoginField::Email {
                state.switch_field();
            } else if !state.email.trim().is_empty() && !state.password.is_empty() {
                state.submitting = true;
                return Some(LoginAction::Submit {
                    email: state.email.trim().to_string(),
                    password: state.password.clone(),
                });
            }
        }
        KeyCode::Backspace => {
            state.field_mut().pop();
        }
        KeyCode::Char(c) => state.field_mut().push(c),
        _ => {}
    }

    None
}
