//! In-process [`RecordStore`] used by tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{RecordStore, StoreResult};
use crate::error::DashboardError;
use crate::models::{Client, ClientDraft, Project, ProjectDraft};

#[derive(Default)]
pub struct MemoryStore {
    clients: Mutex<Vec<Client>>,
    projects: Mutex<Vec<Project>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(100),
            ..Self::default()
        }
    }

    pub fn with_data(clients: Vec<Client>, projects: Vec<Project>) -> Self {
        let store = Self::new();
        *store.clients.lock().unwrap() = clients;
        *store.projects.lock().unwrap() = projects;
        store
    }

    /// Make every following call fail like a dropped connection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DashboardError::Store(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) as i64
    }

    fn newest_first<T: Clone>(items: &[T], created: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
        let mut items = items.to_vec();
        items.sort_by_key(|item| std::cmp::Reverse(created(item)));
        items
    }

    fn apply_project(project: &mut Project, draft: &ProjectDraft) {
        project.name = draft.name.clone();
        project.project_type = draft.project_type.clone();
        project.deadline = draft.deadline.map(|d| d.format("%Y-%m-%d").to_string());
        project.cost = Some(draft.cost);
        project.advance = Some(draft.advance);
        project.work_status = Some(draft.work_status);
        project.payment_status = Some(draft.payment_status);
        project.file_links = draft.file_links.clone();
        project.notes = draft.notes.clone();
    }
}

fn not_found() -> DashboardError {
    DashboardError::Store(sqlx::Error::RowNotFound)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        self.check()?;
        let clients = self.clients.lock().unwrap();
        Ok(Self::newest_first(&clients, |c| c.created_at))
    }

    async fn get_client(&self, id: i64) -> StoreResult<Client> {
        self.check()?;
        let clients = self.clients.lock().unwrap();
        clients.iter().find(|c| c.id == id).cloned().ok_or_else(not_found)
    }

    async fn insert_client(&self, draft: &ClientDraft) -> StoreResult<Client> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let client = Client {
            id: self.next_id(),
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.clone(),
            logo_path: draft.logo_path.clone(),
            notes: draft.notes.clone(),
            created_at: Utc::now(),
        };
        self.clients.lock().unwrap().push(client.clone());
        Ok(client)
    }

    async fn update_client(&self, id: i64, draft: &ClientDraft) -> StoreResult<Client> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut clients = self.clients.lock().unwrap();
        let client = clients.iter_mut().find(|c| c.id == id).ok_or_else(not_found)?;
        client.name = draft.name.clone();
        client.email = draft.email.clone();
        client.phone = draft.phone.clone();
        client.logo_path = draft.logo_path.clone();
        client.notes = draft.notes.clone();
        Ok(client.clone())
    }

    async fn delete_client(&self, id: i64) -> StoreResult<()> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.projects.lock().unwrap().retain(|p| p.client_id != id);
        self.clients.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        self.check()?;
        let projects = self.projects.lock().unwrap();
        Ok(Self::newest_first(&projects, |p| p.created_at))
    }

    async fn list_client_projects(&self, client_id: i64) -> StoreResult<Vec<Project>> {
        self.check()?;
        let projects = self.projects.lock().unwrap();
        let owned: Vec<Project> = projects.iter().filter(|p| p.client_id == client_id).cloned().collect();
        Ok(Self::newest_first(&owned, |p| p.created_at))
    }

    async fn insert_project(&self, client_id: i64, draft: &ProjectDraft) -> StoreResult<Project> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut project = Project::fixture(self.next_id(), client_id, &draft.name);
        // strictly newer than anything inserted before
        project.created_at = Utc::now() + Duration::milliseconds(self.write_count() as i64);
        Self::apply_project(&mut project, draft);
        self.projects.lock().unwrap().push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: i64, draft: &ProjectDraft) -> StoreResult<Project> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut projects = self.projects.lock().unwrap();
        let project = projects.iter_mut().find(|p| p.id == id).ok_or_else(not_found)?;
        Self::apply_project(project, draft);
        Ok(project.clone())
    }

    async fn delete_project(&self, id: i64) -> StoreResult<()> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.projects.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }
}
