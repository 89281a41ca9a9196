//! Leads workbook storage.
//!
//! Leads are kept in a single `.xlsx` workbook with one worksheet, `Leads`, whose first row
//! is [`LEAD_COLUMNS`]. Each submission is appended as one row of text cells.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::{Lead, LEAD_COLUMNS};

pub const SHEET_NAME: &str = "Leads";

/// Creates the workbook with its header row if the file does not exist yet.
///
/// An existing file is left untouched; its headers are not checked.
pub fn ensure(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    if path.exists() {
        return Ok(());
    }

    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(SHEET_NAME)
        .map_err(|e| anyhow::anyhow!("Failed to add worksheet: {}", e))?;
    write_row(sheet, 1, &LEAD_COLUMNS);

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .with_context(|| format!("Failed to write workbook {}", path.display()))?;

    tracing::info!("Created leads workbook at {}", path.display());
    Ok(())
}

/// Appends one lead below the last used row of the first worksheet.
///
/// Load, append and save are separate steps; concurrent callers on the same file must be
/// serialized by the caller (see [`LeadSheet`]).
pub fn append(path: &Path, lead: &Lead) -> anyhow::Result<()> {
    ensure(path)?;

    let mut book = umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let sheet = book
        .get_sheet_collection_mut()
        .first_mut()
        .with_context(|| format!("Workbook {} has no worksheet", path.display()))?;

    let next_row = sheet.get_highest_row() + 1;
    write_row(sheet, next_row, &lead.row());

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;

    Ok(())
}

/// Reads every lead row (everything below the header) from the first worksheet.
pub fn read_leads(path: &Path) -> anyhow::Result<Vec<Lead>> {
    let book = umya_spreadsheet::reader::xlsx::read(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let sheet = book
        .get_sheet_collection()
        .first()
        .with_context(|| format!("Workbook {} has no worksheet", path.display()))?;

    let leads = (2..=sheet.get_highest_row())
        .map(|row| {
            let cells: Vec<String> = (1..=LEAD_COLUMNS.len() as u32)
                .map(|col| sheet.get_value((col, row)))
                .collect();
            Lead::from_row(&cells)
        })
        .collect();

    Ok(leads)
}

fn write_row(sheet: &mut umya_spreadsheet::Worksheet, row: u32, values: &[&str]) {
    for (index, value) in values.iter().enumerate() {
        sheet
            .get_cell_mut((index as u32 + 1, row))
            .set_value_string(*value);
    }
}

/// Shared handle to the leads workbook.
///
/// Appends through one handle are serialized by an in-process lock and run on tokio's
/// blocking pool. Other processes writing the same file are not coordinated.
#[derive(Clone)]
pub struct LeadSheet {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl LeadSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `lead` to the workbook.
    ///
    /// The lock guard is held by the blocking task, so dropping this future mid-write does
    /// not let the next append start until the current save has finished.
    pub async fn append(&self, lead: Lead) -> anyhow::Result<()> {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            append(&path, &lead)
        })
        .await
        .context("Spreadsheet writer task failed")?
    }

    pub async fn read_leads(&self) -> anyhow::Result<Vec<Lead>> {
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            read_leads(&path)
        })
        .await
        .context("Spreadsheet reader task failed")?
    }
}
