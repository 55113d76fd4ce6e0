use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::error::DashboardError;
use crate::models::{PaymentStatus, Project, ProjectDraft, ProjectForm, WorkStatus};
use crate::ui::components::{render_fields, render_help};

pub enum ProjectWizardAction {
    Cancel,
    /// `project_id` is `None` when creating.
    Save {
        client_id: i64,
        project_id: Option<i64>,
        draft: ProjectDraft,
    },
    Invalid(DashboardError),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ProjectField {
    Name,
    Type,
    Deadline,
    Cost,
    Advance,
    WorkStatus,
    PaymentStatus,
    FileLinks,
    Notes,
}

impl ProjectField {
    const ORDER: [ProjectField; 9] = [
        ProjectField::Name,
        ProjectField::Type,
        ProjectField::Deadline,
        ProjectField::Cost,
        ProjectField::Advance,
        ProjectField::WorkStatus,
        ProjectField::PaymentStatus,
        ProjectField::FileLinks,
        ProjectField::Notes,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn is_status(self) -> bool {
        matches!(self, ProjectField::WorkStatus | ProjectField::PaymentStatus)
    }
}

pub struct ProjectWizardState {
    pub client_id: i64,
    pub project_id: Option<i64>,
    pub form: ProjectForm,
    pub current_field: ProjectField,
    pub editing: bool,
}

impl ProjectWizardState {
    pub fn new(client_id: i64) -> Self {
        Self {
            client_id,
            project_id: None,
            form: ProjectForm::default(),
            current_field: ProjectField::Name,
            editing: false,
        }
    }

    pub fn from_existing(project: &Project) -> Self {
        Self {
            client_id: project.client_id,
            project_id: Some(project.id),
            form: ProjectForm::from_project(project),
            current_field: ProjectField::Name,
            editing: false,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        let i = (self.current_field.index() + 1) % ProjectField::ORDER.len();
        self.current_field = ProjectField::ORDER[i];
    }

    pub fn previous_field(&mut self) {
        let len = ProjectField::ORDER.len();
        let i = (self.current_field.index() + len - 1) % len;
        self.current_field = ProjectField::ORDER[i];
    }

    /// Step the focused status field through its values.
    pub fn cycle_status(&mut self, forward: bool) {
        match self.current_field {
            ProjectField::WorkStatus => {
                self.form.work_status = step(&WorkStatus::ALL, self.form.work_status, forward);
            }
            ProjectField::PaymentStatus => {
                self.form.payment_status =
                    step(&PaymentStatus::ALL, self.form.payment_status, forward);
            }
            _ => {}
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let field_value = match self.current_field {
            ProjectField::Name => &mut self.form.name,
            ProjectField::Type => &mut self.form.project_type,
            ProjectField::Deadline => &mut self.form.deadline,
            ProjectField::Cost => &mut self.form.cost,
            ProjectField::Advance => &mut self.form.advance,
            ProjectField::FileLinks => &mut self.form.file_links,
            ProjectField::Notes => &mut self.form.notes,
            ProjectField::WorkStatus | ProjectField::PaymentStatus => return,
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

fn step<T: Copy + PartialEq>(values: &[T], current: T, forward: bool) -> T {
    let len = values.len();
    let i = values.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
    values[next]
}

pub fn render_project_wizard<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(11),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.project_id.is_none() {
        "New Project"
    } else {
        "Edit Project"
    };

    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let form = &state.form;
    let fields = [
        ("Name *", form.name.clone()),
        ("Type", form.project_type.clone()),
        ("Deadline (YYYY-MM-DD)", form.deadline.clone()),
        ("Budget", form.cost.clone()),
        ("Advance", form.advance.clone()),
        ("Work status", format!("< {} >", form.work_status.label())),
        ("Payment status", format!("< {} >", form.payment_status)),
        ("File links", form.file_links.clone()),
        ("Notes", form.notes.clone()),
    ];
    render_fields(
        f,
        chunks[1],
        "Project Details",
        &fields,
        state.current_field.index(),
        state.editing,
    );

    let help_text = if state.editing {
        "Enter - Save field | Esc - Cancel editing"
    } else if state.current_field.is_status() {
        "Left/Right/Enter - Change status | Up/Down - Navigate fields | S - Save project | Esc - Cancel"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save project | Esc - Cancel"
    };
    render_help(f, chunks[2], help_text);
}

pub fn handle_key(state: &mut ProjectWizardState, key: KeyCode) -> Option<ProjectWizardAction> {
    if state.current_field.is_status() && !state.editing {
        match key {
            KeyCode::Enter | KeyCode::Right => {
                state.cycle_status(true);
                return None;
            }
            KeyCode::Left => {
                state.cycle_status(false);
                return None;
            }
            _ => {}
        }
    }

    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ProjectWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down | KeyCode::Tab if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => {
            return Some(match state.form.validate() {
                Ok(draft) => ProjectWizardAction::Save {
                    client_id: state.client_id,
                    project_id: state.project_id,
                    draft,
                },
                Err(e) => ProjectWizardAction::Invalid(e),
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

    fn focus(state: &mut ProjectWizardState, field: ProjectField) {
        while state.current_field != field {
            handle_key(state, KeyCode::Down);
        }
    }

    fn type_into(state: &mut ProjectWizardState, field: ProjectField, text: &str) {
        focus(state, field);
        handle_key(state, KeyCode::Enter);
        for c in text.chars() {
            handle_key(state, KeyCode::Char(c));
        }
        handle_key(state, KeyCode::Enter);
    }

    #[test]
    fn status_fields_cycle_without_editing() {
        let mut state = ProjectWizardState::new(3);
        focus(&mut state, ProjectField::PaymentStatus);
        handle_key(&mut state, KeyCode::Enter);
        assert!(!state.editing);
        assert_eq!(state.form.payment_status, PaymentStatus::Partial);

        handle_key(&mut state, KeyCode::Left);
        handle_key(&mut state, KeyCode::Left);
        assert_eq!(state.form.payment_status, PaymentStatus::Paid);

        focus(&mut state, ProjectField::WorkStatus);
        handle_key(&mut state, KeyCode::Left);
        assert_eq!(state.form.work_status, WorkStatus::Archived);
    }

    #[test]
    fn save_carries_ids_and_parsed_values() {
        let mut project = Project::fixture(12, 3, "Film");
        project.cost = Some(900.0);
        let mut state = ProjectWizardState::from_existing(&project);
        type_into(&mut state, ProjectField::Advance, "300");

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ProjectWizardAction::Save {
                client_id,
                project_id,
                draft,
            }) => {
                assert_eq!(client_id, 3);
                assert_eq!(project_id, Some(12));
                assert_eq!(draft.cost, 900.0);
                assert_eq!(draft.advance, 300.0);
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn bad_money_is_reported() {
        let mut state = ProjectWizardState::new(3);
        type_into(&mut state, ProjectField::Name, "Reel");
        type_into(&mut state, ProjectField::Cost, "lots");

        match handle_key(&mut state, KeyCode::Char('s')) {
            Some(ProjectWizardAction::Invalid(e)) => {
                assert_eq!(e.to_string(), "Budget must be a non-negative number")
            }
            _ => panic!("expected validation error"),
        }
    }
}
