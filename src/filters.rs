//! Search and filter helpers for the client and project lists.
//!
//! All functions keep the relative order of their input.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::DashboardError;
use crate::models::{Client, PaymentStatus, Project, WorkStatus};

/// Number of entries shown in the "upcoming deadlines" panel.
pub const UPCOMING_LIMIT: usize = 3;

/// Case-insensitive substring search over name, email and phone.
pub fn filter_clients<'a>(clients: &'a [Client], query: &str) -> Vec<&'a Client> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return clients.iter().collect();
    }

    clients
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&q)
                || c.email.as_deref().unwrap_or("").to_lowercase().contains(&q)
                || c.phone.as_deref().unwrap_or("").to_lowercase().contains(&q)
        })
        .collect()
}

/// A status column that can be filtered on.
pub trait Status: Copy + PartialEq + FromStr + 'static {
    const VALUES: &'static [Self];

    fn label(&self) -> String;
}

impl Status for WorkStatus {
    const VALUES: &'static [Self] = &WorkStatus::ALL;

    fn label(&self) -> String {
        WorkStatus::label(self)
    }
}

impl Status for PaymentStatus {
    const VALUES: &'static [Self] = &PaymentStatus::ALL;

    fn label(&self) -> String {
        self.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: Status> StatusFilter<T> {
    /// A project with no status only passes `All`.
    pub fn matches(&self, value: Option<T>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => value == Some(*wanted),
        }
    }

    /// All, then each status in order, then back to All.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(T::VALUES[0]),
            StatusFilter::Only(current) => {
                let idx = T::VALUES.iter().position(|v| *v == current).unwrap_or(0);
                match T::VALUES.get(idx + 1) {
                    Some(next) => StatusFilter::Only(*next),
                    None => StatusFilter::All,
                }
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            StatusFilter::All => "All".to_string(),
            StatusFilter::Only(status) => status.label(),
        }
    }
}

impl<T: Status> FromStr for StatusFilter<T> {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(StatusFilter::All);
        }
        s.parse::<T>()
            .map(StatusFilter::Only)
            .map_err(|_| DashboardError::Validation(format!("Unknown filter '{}'", s)))
    }
}

impl<T: Status> fmt::Display for StatusFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Active work and payment filters. Replaced, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProjectFilters {
    pub work: StatusFilter<WorkStatus>,
    pub payment: StatusFilter<PaymentStatus>,
}

impl ProjectFilters {
    pub fn new(work: StatusFilter<WorkStatus>, payment: StatusFilter<PaymentStatus>) -> Self {
        Self { work, payment }
    }

    pub fn cycle_work(self) -> Self {
        Self {
            work: self.work.next(),
            ..self
        }
    }

    pub fn cycle_payment(self) -> Self {
        Self {
            payment: self.payment.next(),
            ..self
        }
    }

    pub fn matches(&self, project: &Project) -> bool {
        self.work.matches(project.work_status) && self.payment.matches(project.payment_status)
    }
}

pub fn filter_projects<'a>(projects: &'a [Project], filters: &ProjectFilters) -> Vec<&'a Project> {
    projects.iter().filter(|p| filters.matches(p)).collect()
}

/// Dates are read as midnight UTC; full RFC 3339 timestamps are also accepted.
pub fn parse_deadline(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `YYYY-MM-DD` when the text parses, the text itself otherwise.
pub fn format_deadline(text: &str) -> String {
    match parse_deadline(text) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => text.to_string(),
    }
}

pub fn display_deadline(deadline: Option<&str>) -> String {
    match deadline {
        Some(text) if !text.is_empty() => format_deadline(text),
        _ => "-".to_string(),
    }
}

/// Unpaid work due at or after `now`, soonest first, at most `limit` entries.
///
/// Projects whose deadline does not parse are skipped.
pub fn upcoming_deadlines<'a>(
    projects: &'a [Project],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<&'a Project> {
    let mut due: Vec<(DateTime<Utc>, &Project)> = projects
        .iter()
        .filter(|p| p.payment_status != Some(PaymentStatus::Paid))
        .filter_map(|p| {
            let deadline = p.deadline.as_deref().filter(|d| !d.is_empty())?;
            parse_deadline(deadline).map(|at| (at, p))
        })
        .filter(|(at, _)| *at >= now)
        .collect();

    due.sort_by_key(|(at, _)| *at);
    due.into_iter().take(limit).map(|(_, p)| p).collect()
}

/// Unpaid work whose deadline has passed. Missing or unparseable deadlines
/// are never overdue.
pub fn is_overdue(project: &Project, now: DateTime<Utc>) -> bool {
    if project.payment_status == Some(PaymentStatus::Paid) {
        return false;
    }

    project
        .deadline
        .as_deref()
        .filter(|d| !d.is_empty())
        .and_then(parse_deadline)
        .is_some_and(|at| at < now)
}
