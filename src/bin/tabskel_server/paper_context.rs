//! What a paper's replication package says about variable names: header
//! names from its data files, identifiers from its code and text from its
//! PDF. Feeds the pre-annotation prompt.

use std::collections::BTreeSet;

use calamine::{Reader, open_workbook_auto};
use regex::Regex;
use walkdir::WalkDir;

use super::*;

const CODE_EXTENSIONS: [&str; 9] = ["py", "r", "jl", "m", "sas", "do", "ado", "qmd", "ipynb"];
const MAX_CANDIDATES: usize = 3000;
const MAX_PDF_CHARS: usize = 12_000;
const MAX_CODE_CHARS: usize = 8000;
const MAX_SHEETS: usize = 50;
const MAX_NAME_LEN: usize = 60;

#[derive(Debug, Default)]
pub(super) struct PaperContext {
    pub(super) pdf_path: Option<PathBuf>,
    pub(super) pdf_text: String,
    pub(super) candidate_columns: Vec<String>,
    pub(super) candidate_code_vars: Vec<String>,
}

impl PaperContext {
    /// Unreadable files are logged and skipped.
    pub(super) fn load(paper_dir: &FsPath) -> Result<Self> {
        let files = files_under(paper_dir);
        let pdf_path = find_pdf(paper_dir);
        let pdf_text = pdf_path.as_deref().map(read_pdf_text).unwrap_or_default();
        let data_files: Vec<&PathBuf> = files.iter().filter(|p| is_data_file(p)).collect();
        let code_files: Vec<&PathBuf> = files.iter().filter(|p| is_code_file(p)).collect();
        tracing::info!(
            paper_dir = %paper_dir.display(),
            pdf = ?pdf_path,
            data_files = data_files.len(),
            code_files = code_files.len(),
            "loaded paper context"
        );
        Ok(Self {
            candidate_columns: data_columns(&data_files),
            candidate_code_vars: code_vars(&code_files)?,
            pdf_path,
            pdf_text,
        })
    }
}

fn files_under(root: &FsPath) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn extension(path: &FsPath) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn file_name_lower(path: &FsPath) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

fn is_data_file(path: &FsPath) -> bool {
    matches!(
        extension(path).as_deref(),
        Some("csv" | "tsv" | "xlsx" | "xlsm" | "xls" | "ods")
    )
}

/// Log files are skipped even with a code extension.
fn is_code_file(path: &FsPath) -> bool {
    extension(path).is_some_and(|ext| CODE_EXTENSIONS.contains(&ext.as_str()))
        && !file_name_lower(path).contains("log")
}

/// A `nomask_*.pdf` at the top of the paper directory wins over any other PDF
/// there.
pub(super) fn find_pdf(paper_dir: &FsPath) -> Option<PathBuf> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(paper_dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && extension(p).as_deref() == Some("pdf"))
        .collect();
    pdfs.sort();
    let unmasked = pdfs
        .iter()
        .position(|p| file_name_lower(p).starts_with("nomask_"));
    match unmasked {
        Some(i) => Some(pdfs.swap_remove(i)),
        None => pdfs.into_iter().next(),
    }
}

/// Text extracted ahead of time into `<pdf stem>.txt` beside the PDF; empty
/// when there is none.
pub(super) fn read_pdf_text(pdf: &FsPath) -> String {
    let sidecar = pdf.with_extension("txt");
    match std::fs::read(&sidecar) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .chars()
            .take(MAX_PDF_CHARS)
            .collect(),
        Err(err) => {
            tracing::debug!(path = %sidecar.display(), error = %err, "no extracted pdf text");
            String::new()
        }
    }
}

pub(super) fn data_columns(paths: &[&PathBuf]) -> Vec<String> {
    let mut columns = BTreeSet::new();
    for path in paths {
        if columns.len() >= MAX_CANDIDATES {
            break;
        }
        let read = match extension(path).as_deref() {
            Some("csv") => delimited_header(path, b','),
            Some("tsv") => delimited_header(path, b'\t'),
            _ => workbook_headers(path),
        };
        match read {
            Ok(names) => columns.extend(
                names
                    .into_iter()
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
            ),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %format!("{:#}", err), "skipping data file")
            }
        }
    }
    columns.into_iter().take(MAX_CANDIDATES).collect()
}

fn delimited_header(path: &FsPath, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let header = reader
        .headers()
        .with_context(|| format!("read header of {}", path.display()))?;
    Ok(header.iter().map(str::to_string).collect())
}

/// First row of each sheet.
fn workbook_headers(path: &FsPath) -> Result<Vec<String>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow::anyhow!("open {}: {}", path.display(), e))?;
    let sheets: Vec<String> = workbook.sheet_names().into_iter().take(MAX_SHEETS).collect();
    let mut names = Vec::new();
    for sheet in &sheets {
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| anyhow::anyhow!("read sheet '{}' of {}: {}", sheet, path.display(), e))?;
        if let Some(first) = range.rows().next() {
            names.extend(first.iter().map(|cell| cell.to_string()));
        }
    }
    Ok(names)
}

/// Identifier-like tokens from the head of each code file.
pub(super) fn code_vars(paths: &[&PathBuf]) -> Result<Vec<String>> {
    let ident = Regex::new(r"[A-Za-z_][A-Za-z0-9_.]*").context("compile identifier pattern")?;
    let mut vars = BTreeSet::new();
    for path in paths {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping code file");
                continue;
            }
        };
        let text: String = String::from_utf8_lossy(&bytes)
            .chars()
            .take(MAX_CODE_CHARS)
            .collect();
        vars.extend(
            ident
                .find_iter(&text)
                .map(|m| m.as_str())
                .filter(|name| name.len() <= MAX_NAME_LEN)
                .map(str::to_string),
        );
        if vars.len() > MAX_CANDIDATES {
            break;
        }
    }
    Ok(vars.into_iter().take(MAX_CANDIDATES).collect())
}

#[cfg(test)]
#[path = "../../tests/bin/tabskel_server/paper_context_tests.rs"]
mod tests;
