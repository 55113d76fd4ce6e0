use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use super::client::optional_text;
use super::status::{PaymentStatus, WorkStatus};
use crate::error::DashboardError;

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub client_id: i64,
    pub name: String,
    pub project_type: Option<String>,
    /// Raw deadline text as returned by the store; may not parse.
    pub deadline: Option<String>,
    pub cost: Option<f64>,
    pub advance: Option<f64>,
    pub work_status: Option<WorkStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub file_links: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Statuses are stored as text; values we don't recognise load as missing.
impl<'r> FromRow<'r, PgRow> for Project {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let work_status: Option<String> = row.try_get("work_status")?;
        let payment_status: Option<String> = row.try_get("payment_status")?;

        Ok(Self {
            id: row.try_get("id")?,
            client_id: row.try_get("client_id")?,
            name: row.try_get("name")?,
            project_type: row.try_get("type")?,
            deadline: row.try_get("deadline")?,
            cost: row.try_get("cost")?,
            advance: row.try_get("advance")?,
            work_status: work_status.and_then(|s| s.parse().ok()),
            payment_status: payment_status.and_then(|s| s.parse().ok()),
            file_links: row.try_get("file_links")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Validated project fields ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub project_type: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub cost: f64,
    pub advance: f64,
    pub work_status: WorkStatus,
    pub payment_status: PaymentStatus,
    pub file_links: Option<String>,
    pub notes: Option<String>,
}

/// Raw text of the project form, as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectForm {
    pub name: String,
    pub project_type: String,
    pub deadline: String,
    pub cost: String,
    pub advance: String,
    pub work_status: WorkStatus,
    pub payment_status: PaymentStatus,
    pub file_links: String,
    pub notes: String,
}

impl ProjectForm {
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            project_type: project.project_type.clone().unwrap_or_default(),
            deadline: project
                .deadline
                .as_deref()
                .map(crate::filters::format_deadline)
                .unwrap_or_default(),
            cost: project.cost.map(format_number).unwrap_or_default(),
            advance: project.advance.map(format_number).unwrap_or_default(),
            work_status: project.work_status.unwrap_or_default(),
            payment_status: project.payment_status.unwrap_or_default(),
            file_links: project.file_links.clone().unwrap_or_default(),
            notes: project.notes.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ProjectDraft, DashboardError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DashboardError::Validation("Project name is required".to_string()));
        }

        let deadline = match self.deadline.trim() {
            "" => None,
            text => Some(NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
                DashboardError::Validation("Deadline must be a date (YYYY-MM-DD)".to_string())
            })?),
        };

        Ok(ProjectDraft {
            name: name.to_string(),
            project_type: optional_text(&self.project_type),
            deadline,
            cost: parse_money("Budget", &self.cost)?,
            advance: parse_money("Advance", &self.advance)?,
            work_status: self.work_status,
            payment_status: self.payment_status,
            file_links: optional_text(&self.file_links),
            notes: optional_text(&self.notes),
        })
    }
}

fn parse_money(field: &str, text: &str) -> Result<f64, DashboardError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }

    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(DashboardError::Validation(format!(
            "{} must be a non-negative number",
            field
        ))),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
impl Project {
    pub(crate) fn fixture(id: i64, client_id: i64, name: &str) -> Self {
        Self {
            id,
            client_id,
            name: name.to_string(),
            project_type: None,
            deadline: None,
            cost: None,
            advance: None,
            work_status: Some(WorkStatus::NotStarted),
            payment_status: Some(PaymentStatus::Unpaid),
            file_links: None,
            notes: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str) -> ProjectForm {
        ProjectForm {
            name: name.to_string(),
            ..ProjectForm::default()
        }
    }

    #[test]
    fn blank_money_defaults_to_zero() {
        let draft = form("Wedding film").validate().unwrap();
        assert_eq!(draft.cost, 0.0);
        assert_eq!(draft.advance, 0.0);
        assert_eq!(draft.work_status, WorkStatus::NotStarted);
        assert_eq!(draft.payment_status, PaymentStatus::Unpaid);
        assert_eq!(draft.deadline, None);
        assert_eq!(draft.project_type, None);
    }

    #[test]
    fn rejects_blank_name() {
        let err = form("  ").validate().unwrap_err();
        assert!(matches!(err, DashboardError::Validation(msg) if msg == "Project name is required"));
    }

    #[test]
    fn rejects_negative_or_garbage_money() {
        let mut f = form("Reel");
        f.cost = "-5".to_string();
        assert!(f.validate().is_err());

        f.cost = "12k".to_string();
        assert!(f.validate().is_err());

        f.cost = "1500.50".to_string();
        f.advance = " 500 ".to_string();
        let draft = f.validate().unwrap();
        assert_eq!(draft.cost, 1500.5);
        assert_eq!(draft.advance, 500.0);
    }

    #[test]
    fn validates_deadline_format() {
        let mut f = form("Event");
        f.deadline = "20/10/2026".to_string();
        assert!(f.validate().is_err());

        f.deadline = "2026-10-20".to_string();
        assert_eq!(
            f.validate().unwrap().deadline,
            NaiveDate::from_ymd_opt(2026, 10, 20)
        );
    }

    #[test]
    fn form_round_trips_stored_project() {
        let mut project = Project::fixture(7, 1, "Teaser");
        project.cost = Some(1000.0);
        project.advance = Some(250.5);
        project.deadline = Some("2026-11-02".to_string());
        project.payment_status = None;

        let f = ProjectForm::from_project(&project);
        assert_eq!(f.cost, "1000");
        assert_eq!(f.advance, "250.5");
        assert_eq!(f.deadline, "2026-11-02");
        assert_eq!(f.payment_status, PaymentStatus::Unpaid);
    }
}
