use chrono::{DateTime, Utc};

use crate::error::DashboardError;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub logo_path: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Email, then phone, then a placeholder.
    pub fn contact_line(&self) -> &str {
        non_empty(&self.email)
            .or_else(|| non_empty(&self.phone))
            .unwrap_or("No contact info")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Validated client fields ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientDraft {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub logo_path: Option<String>,
    pub notes: Option<String>,
}

/// Raw text of the client form, as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub logo_path: String,
    pub notes: String,
}

impl ClientForm {
    pub fn from_client(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            email: client.email.clone().unwrap_or_default(),
            phone: client.phone.clone().unwrap_or_default(),
            logo_path: client.logo_path.clone().unwrap_or_default(),
            notes: client.notes.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ClientDraft, DashboardError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DashboardError::Validation("Client name is required".to_string()));
        }

        Ok(ClientDraft {
            name: name.to_string(),
            email: optional_text(&self.email),
            phone: optional_text(&self.phone),
            logo_path: optional_text(&self.logo_path),
            notes: optional_text(&self.notes),
        })
    }
}

/// Empty form text is stored as NULL.
pub(crate) fn optional_text(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
impl Client {
    pub(crate) fn fixture(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: None,
            phone: None,
            logo_path: None,
            notes: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_a_name() {
        let form = ClientForm {
            name: "   ".to_string(),
            email: "a@b.c".to_string(),
            ..ClientForm::default()
        };
        let err = form.validate().unwrap_err();
        assert!(matches!(err, DashboardError::Validation(msg) if msg == "Client name is required"));
    }

    #[test]
    fn draft_trims_name_and_nulls_empty_fields() {
        let form = ClientForm {
            name: "  Acme  ".to_string(),
            phone: "+91 98".to_string(),
            notes: "likes warm tones".to_string(),
            ..ClientForm::default()
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.name, "Acme");
        assert_eq!(draft.email, None);
        assert_eq!(draft.phone.as_deref(), Some("+91 98"));
        assert_eq!(draft.logo_path, None);
        assert_eq!(draft.notes.as_deref(), Some("likes warm tones"));
    }

    #[test]
    fn contact_line_falls_back() {
        let mut client = Client {
            id: 1,
            name: "Acme".to_string(),
            email: Some(String::new()),
            phone: Some("123".to_string()),
            logo_path: None,
            notes: None,
            created_at: Utc::now(),
        };
        assert_eq!(client.contact_line(), "123");
        client.phone = None;
        assert_eq!(client.contact_line(), "No contact info");
    }
}
