mod client;
mod project;
mod status;

pub use client::{Client, ClientDraft, ClientForm};
pub use project::{Project, ProjectDraft, ProjectForm};
pub use status::{PaymentStatus, WorkStatus};
