//! Report sink.
//!
//! Writes the ordered rows, header first. The format follows the output
//! extension: `.json` gets pretty JSON, anything else CSV.

use std::path::Path;

use crate::error::Result;
use crate::models::Report;

/// Output formats understood by [`save_report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }
}

/// Write the report to `path`, creating parent directories as needed.
pub fn save_report(report: &Report, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match ReportFormat::from_path(path) {
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            for record in report.records() {
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            std::fs::write(path, json)?;
        }
    }

    log::info!("Saved {} rows to {}", report.rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelInfo, Platform, RegistrationStatus, ResultRow, RunStats};
    use tempfile::TempDir;

    fn report(with_engagement: bool) -> Report {
        let mut a = ChannelInfo::new("a", "50000", "https://t.me/a");
        a.platform = Platform::Telegram;
        a.avg_post_reach = 812.0;
        a.er_percent = 2.5;
        let mut b = ChannelInfo::new("b, the second", "200000", "https://instagram.com/b");
        b.platform = Platform::Instagram;

        Report {
            rows: vec![
                ResultRow::finalize(&a, RegistrationStatus::Registered),
                ResultRow::finalize(&b, RegistrationStatus::NotApplicable),
            ],
            with_engagement,
            stats: RunStats::default(),
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("out.JSON")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("out.csv")), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path(Path::new("out")), ReportFormat::Csv);
    }

    #[test]
    fn test_save_csv() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/results.csv");

        save_report(&report(false), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Channel Name,Followers Count,Original Link,Platform,Registration Status"
        );
        assert_eq!(lines[1], "a,50000,https://t.me/a,telegram,registered");
        assert_eq!(
            lines[2],
            "\"b, the second\",200000,https://instagram.com/b,instagram,not applicable"
        );
    }

    #[test]
    fn test_save_csv_with_engagement() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");

        save_report(&report(true), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].ends_with("Avg Post Reach,ER Percent"));
        assert!(lines[1].ends_with("registered,812.00,2.50"));
        assert!(lines[2].ends_with("not applicable,0.00,0.00"));
    }

    #[test]
    fn test_save_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.json");

        save_report(&report(false), &path).unwrap();

        let parsed: Report = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed.rows, report(false).rows);
    }
}
