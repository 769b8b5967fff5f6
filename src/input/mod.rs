//! Link input sources.
//!
//! Links are read in file order and never deduplicated. Only tokens that
//! mention a supported platform host are kept, each normalized with
//! [`normalize_link`].

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Platform;
use crate::utils::url::normalize_link;

/// Read links from a `.csv` file (every cell) or any text file.
pub fn read_links(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let links = if is_csv {
        read_csv_links(path)?
    } else {
        links_in_text(&std::fs::read_to_string(path)?)
    };

    if links.is_empty() {
        return Err(AppError::input(format!(
            "no supported links found in {}",
            path.display()
        )));
    }
    log::info!("Read {} links from {}", links.len(), path.display());
    Ok(links)
}

/// Links found in free-form text separated by commas, semicolons or whitespace.
fn links_in_text(content: &str) -> Vec<String> {
    collect_links(std::iter::once(content))
}

fn read_csv_links(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        cells.extend(record.iter().map(str::to_string));
    }
    Ok(collect_links(cells.iter().map(String::as_str)))
}

fn collect_links<'a>(cells: impl Iterator<Item = &'a str>) -> Vec<String> {
    cells
        .flat_map(|cell| cell.split(|c: char| c == ',' || c == ';' || c.is_whitespace()))
        .map(str::trim)
        .filter(|token| !token.is_empty() && Platform::detect(token) != Platform::Unknown)
        .map(normalize_link)
        .collect()
}
