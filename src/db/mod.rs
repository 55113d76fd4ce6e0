use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::DashboardError;
use crate::models::{Client, ClientDraft, Project, ProjectDraft};

#[cfg(test)]
pub mod memory;

pub type StoreResult<T> = Result<T, DashboardError>;

/// Remote store holding the `clients` and `projects` tables.
///
/// Lists come back newest first (`created_at` descending).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;

    async fn get_client(&self, id: i64) -> StoreResult<Client>;

    async fn insert_client(&self, draft: &ClientDraft) -> StoreResult<Client>;

    async fn update_client(&self, id: i64, draft: &ClientDraft) -> StoreResult<Client>;

    /// Projects of the client go with it.
    async fn delete_client(&self, id: i64) -> StoreResult<()>;

    /// Every project in the studio, for the overview rollups.
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;

    async fn list_client_projects(&self, client_id: i64) -> StoreResult<Vec<Project>>;

    async fn insert_project(&self, client_id: i64, draft: &ProjectDraft) -> StoreResult<Project>;

    async fn update_project(&self, id: i64, draft: &ProjectDraft) -> StoreResult<Project>;

    async fn delete_project(&self, id: i64) -> StoreResult<()>;
}

const CLIENT_COLUMNS: &str = "id, name, email, phone, logo_path, notes, created_at";

// Deadline comes back as text so malformed values survive the trip.
const PROJECT_COLUMNS: &str = r#"
    id,
    client_id,
    name,
    type,
    deadline::text AS deadline,
    cost::float8 AS cost,
    advance::float8 AS advance,
    work_status,
    payment_status,
    file_links,
    notes,
    created_at
"#;

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self, DashboardError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tables if they don't exist yet.
    pub async fn migrate(&self) -> Result<(), DashboardError> {
        sqlx::migrate!()
            .run(self.get_pool())
            .await
            .map_err(|e| DashboardError::Store(e.into()))?;
        info!("schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients ORDER BY created_at DESC",
            CLIENT_COLUMNS
        ))
        .fetch_all(self.get_pool())
        .await?;

        debug!(count = clients.len(), "loaded clients");
        Ok(clients)
    }

    async fn get_client(&self, id: i64) -> StoreResult<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE id = $1",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_one(self.get_pool())
        .await?;

        Ok(client)
    }

    async fn insert_client(&self, draft: &ClientDraft) -> StoreResult<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO clients (name, email, phone, logo_path, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.logo_path)
        .bind(&draft.notes)
        .fetch_one(self.get_pool())
        .await?;

        info!(client_id = client.id, "created client");
        Ok(client)
    }

    async fn update_client(&self, id: i64, draft: &ClientDraft) -> StoreResult<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clients
            SET name = $1, email = $2, phone = $3, logo_path = $4, notes = $5
            WHERE id = $6
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        ))
        .bind(&draft.name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.logo_path)
        .bind(&draft.notes)
        .bind(id)
        .fetch_one(self.get_pool())
        .await?;

        info!(client_id = id, "updated client");
        Ok(client)
    }

    async fn delete_client(&self, id: i64) -> StoreResult<()> {
        // Start a transaction
        let mut tx = self.pool.begin().await?;

        // The schema cascades, but older databases may lack the constraint
        sqlx::query("DELETE FROM projects WHERE client_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(client_id = id, "deleted client");
        Ok(())
    }

    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .fetch_all(self.get_pool())
        .await?;

        debug!(count = projects.len(), "loaded projects");
        Ok(projects)
    }

    async fn list_client_projects(&self, client_id: i64) -> StoreResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {} FROM projects WHERE client_id = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(self.get_pool())
        .await?;

        debug!(client_id, count = projects.len(), "loaded client projects");
        Ok(projects)
    }

    async fn insert_project(&self, client_id: i64, draft: &ProjectDraft) -> StoreResult<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (client_id, name, type, deadline, cost, advance,
                                  work_status, payment_status, file_links, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(client_id)
        .bind(&draft.name)
        .bind(&draft.project_type)
        .bind(draft.deadline)
        .bind(draft.cost)
        .bind(draft.advance)
        .bind(draft.work_status.as_str())
        .bind(draft.payment_status.as_str())
        .bind(&draft.file_links)
        .bind(&draft.notes)
        .fetch_one(self.get_pool())
        .await?;

        info!(client_id, project_id = project.id, "created project");
        Ok(project)
    }

    async fn update_project(&self, id: i64, draft: &ProjectDraft) -> StoreResult<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET name = $1, type = $2, deadline = $3, cost = $4, advance = $5,
                work_status = $6, payment_status = $7, file_links = $8, notes = $9
            WHERE id = $10
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(&draft.name)
        .bind(&draft.project_type)
        .bind(draft.deadline)
        .bind(draft.cost)
        .bind(draft.advance)
        .bind(draft.work_status.as_str())
        .bind(draft.payment_status.as_str())
        .bind(&draft.file_links)
        .bind(&draft.notes)
        .bind(id)
        .fetch_one(self.get_pool())
        .await?;

        info!(project_id = id, "updated project");
        Ok(project)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        info!(project_id = id, "deleted project");
        Ok(())
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database, DashboardError> {
    let db = Database::new(config).await?;
    info!("database connection established");
    Ok(db)
}
