use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::error::DashboardError;
use crate::filters::format_deadline;
use crate::finance::{self, Totals, format_money};
use crate::models::{Client, Project};

/// Column headings of the invoice project table.
pub const COLUMNS: [&str; 9] = [
    "Project", "Type", "Budget", "Advance", "Received", "Pending", "Work", "Payment", "Deadline",
];

pub type InvoiceRow = [String; 9];

/// One row per project, in the order given.
pub fn invoice_rows(projects: &[Project]) -> Vec<InvoiceRow> {
    projects
        .iter()
        .map(|p| {
            let a = finance::amounts(p);
            [
                p.name.clone(),
                p.project_type.clone().unwrap_or_default(),
                a.cost.to_string(),
                a.advance.to_string(),
                a.received.to_string(),
                a.pending.to_string(),
                p.work_status.map(|s| s.as_str().to_string()).unwrap_or_default(),
                p.payment_status.map(|s| s.as_str().to_string()).unwrap_or_default(),
                p.deadline.as_deref().map(format_deadline).unwrap_or_default(),
            ]
        })
        .collect()
}

/// `"Acme Films!"` becomes `acme_films`; names with nothing usable become `client`.
pub fn file_stem(client_name: &str) -> String {
    let lowered = client_name.to_lowercase();
    let mut stem = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "client".to_string()
    } else {
        stem.to_string()
    }
}

/// Everything printed on an exported invoice.
pub struct InvoiceDocument<'a> {
    pub studio_name: &'a str,
    pub currency_symbol: &'a str,
    pub generated_at: DateTime<Local>,
    pub client: &'a Client,
    pub projects: &'a [Project],
}

impl InvoiceDocument<'_> {
    pub fn totals(&self) -> Totals {
        finance::aggregate(self.projects)
    }

    pub fn to_markdown(&self) -> String {
        let mut content = String::new();
        let totals = self.totals();
        let money = |value: f64| format_money(self.currency_symbol, value);

        content.push_str(&format!("# {}\n\n", self.studio_name));
        content.push_str("Client project summary (invoice style)  \n");
        content.push_str(&format!(
            "Generated: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M")
        ));

        content.push_str("## INVOICE\n\n");
        content.push_str(&format!("Client ID: {}\n\n", self.client.id));

        content.push_str("**Bill to:**  \n");
        content.push_str(&format!("{}  \n", escape_cell(or_dash(&self.client.name))));
        for line in [&self.client.email, &self.client.phone].into_iter().flatten() {
            if !line.is_empty() {
                content.push_str(&format!("{}  \n", escape_cell(line)));
            }
        }
        content.push('\n');

        content.push_str("| | |\n|---|---:|\n");
        content.push_str(&format!("| Total budget | {} |\n", money(totals.total)));
        content.push_str(&format!("| Received | {} |\n", money(totals.received)));
        content.push_str(&format!("| Pending | {} |\n\n", money(totals.pending)));

        content.push_str(&format!("| {} |\n", COLUMNS.join(" | ")));
        content.push_str("|---|---|---:|---:|---:|---:|---|---|---|\n");
        for row in invoice_rows(self.projects) {
            let cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
            content.push_str(&format!("| {} |\n", cells.join(" | ")));
        }

        content
    }
}

fn or_dash(text: &str) -> &str {
    if text.is_empty() { "-" } else { text }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Paths written by [`InvoiceExporter::export`].
#[derive(Debug)]
pub struct ExportedInvoice {
    pub markdown_path: PathBuf,
    /// `None` when pandoc was unavailable or failed; only the Markdown exists then.
    pub pdf_path: Option<PathBuf>,
}

impl ExportedInvoice {
    /// The file to hand to the client: the PDF when rendered, else the Markdown.
    pub fn deliverable(&self) -> &Path {
        self.pdf_path.as_deref().unwrap_or(&self.markdown_path)
    }
}

/// Writes invoice documents as Markdown and converts them to PDF with pandoc.
pub struct InvoiceExporter {
    output_dir: PathBuf,
}

impl InvoiceExporter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, DashboardError> {
        let path = output_dir.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        Ok(Self {
            output_dir: path.to_path_buf(),
        })
    }

    pub fn export(&self, document: &InvoiceDocument<'_>) -> Result<ExportedInvoice, DashboardError> {
        let stem = format!("{}_invoice", file_stem(&document.client.name));
        let markdown_path = self.output_dir.join(format!("{}.md", stem));
        let pdf_path = self.output_dir.join(format!("{}.pdf", stem));

        let mut file = File::create(&markdown_path)?;
        file.write_all(document.to_markdown().as_bytes())?;

        let pdf_rendered = match Command::new("pandoc")
            .arg(&markdown_path)
            .arg("-o")
            .arg(&pdf_path)
            .output()
        {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                warn!(
                    "pandoc failed to render PDF: {}",
                    String::from_utf8_lossy(&output.stderr)
                );
                false
            }
            Err(e) => {
                warn!("could not run pandoc: {}", e);
                false
            }
        };

        // A failed run can leave a truncated file behind
        if !pdf_rendered && pdf_path.exists() {
            fs::remove_file(&pdf_path)
                .map_err(|e| DashboardError::Export(format!("{}: {}", pdf_path.display(), e)))?;
        }

        let exported = ExportedInvoice {
            markdown_path,
            pdf_path: pdf_rendered.then_some(pdf_path),
        };

        info!(
            client_id = document.client.id,
            path = %exported.deliverable().display(),
            pdf_rendered,
            "exported invoice"
        );

        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, WorkStatus};

    fn sample_projects() -> Vec<Project> {
        let mut film = Project::fixture(1, 9, "Wedding film");
        film.project_type = Some("wedding".to_string());
        film.cost = Some(1000.0);
        film.advance = Some(300.0);
        film.payment_status = Some(PaymentStatus::Partial);
        film.work_status = Some(WorkStatus::Editing);
        film.deadline = Some("2026-11-02".to_string());

        let mut reel = Project::fixture(2, 9, "Reel | teaser");
        reel.cost = Some(250.0);
        reel.payment_status = None;
        reel.work_status = None;

        vec![film, reel]
    }

    #[test]
    fn rows_follow_the_column_order() {
        let rows = invoice_rows(&sample_projects());
        assert_eq!(
            rows[0],
            [
                "Wedding film", "wedding", "1000", "300", "300", "700", "editing", "partial",
                "2026-11-02",
            ]
            .map(String::from)
        );
        assert_eq!(rows[1][2], "250");
        assert_eq!(rows[1][4], "0");
        assert_eq!(rows[1][6], "");
        assert_eq!(rows[1][8], "");
    }

    #[test]
    fn stems_are_filesystem_safe() {
        assert_eq!(file_stem("Acme Films!"), "acme_films");
        assert_eq!(file_stem("  R&D -- Studio 9 "), "r_d_studio_9");
        assert_eq!(file_stem("!!!"), "client");
        assert_eq!(file_stem(""), "client");
    }

    #[test]
    fn markdown_has_header_totals_and_table() {
        let mut client = Client::fixture(9, "Acme");
        client.email = Some("hello@acme.in".to_string());
        let projects = sample_projects();
        let document = InvoiceDocument {
            studio_name: "Subh Stories Studio",
            currency_symbol: "₹",
            generated_at: Local::now(),
            client: &client,
            projects: &projects,
        };

        let md = document.to_markdown();
        assert!(md.starts_with("# Subh Stories Studio"));
        assert!(md.contains("Client ID: 9"));
        assert!(md.contains("hello@acme.in"));
        assert!(md.contains("| Total budget | ₹1250 |"));
        assert!(md.contains("| Received | ₹300 |"));
        assert!(md.contains("| Pending | ₹950 |"));
        assert!(md.contains("| Project | Type | Budget |"));
        assert!(md.contains("Reel \\| teaser"));
    }

    #[test]
    fn export_never_writes_markdown_under_a_pdf_name() {
        let dir = std::env::temp_dir().join(format!("studio-export-{}", std::process::id()));
        let exporter = InvoiceExporter::new(&dir).unwrap();
        let client = Client::fixture(3, "Acme Films");
        let projects = sample_projects();
        let document = InvoiceDocument {
            studio_name: "Studio",
            currency_symbol: "$",
            generated_at: Local::now(),
            client: &client,
            projects: &projects,
        };

        let out = exporter.export(&document).unwrap();
        assert!(out.markdown_path.exists());
        assert_eq!(out.markdown_path.file_name().unwrap(), "acme_films_invoice.md");

        let pdf = dir.join("acme_films_invoice.pdf");
        match &out.pdf_path {
            Some(path) => {
                assert_eq!(path, &pdf);
                let bytes = fs::read(path).unwrap();
                assert!(bytes.starts_with(b"%PDF"));
                assert_eq!(out.deliverable(), pdf.as_path());
            }
            None => {
                assert!(!pdf.exists());
                assert_eq!(out.deliverable(), out.markdown_path.as_path());
            }
        }

        fs::remove_dir_all(&dir).ok();
    }
}
