//! Flattened result rows and the ordered report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChannelInfo, RegistrationStatus};

/// Base report columns.
pub const HEADER: [&str; 5] = [
    "Channel Name",
    "Followers Count",
    "Original Link",
    "Platform",
    "Registration Status",
];

/// Extra columns written when engagement enrichment is enabled.
pub const ENGAGEMENT_HEADER: [&str; 2] = ["Avg Post Reach", "ER Percent"];

/// One finalized line of the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRow {
    pub channel_name: String,
    pub followers_count: String,
    pub original_link: String,
    pub platform: String,
    pub registration_status: RegistrationStatus,
    pub avg_post_reach: f32,
    pub er_percent: f32,
}

impl ResultRow {
    /// Freeze a channel record that has reached a terminal state.
    pub fn finalize(info: &ChannelInfo, status: RegistrationStatus) -> Self {
        Self {
            channel_name: info.channel_name.clone(),
            followers_count: info.followers_count.clone(),
            original_link: info.original_link.clone(),
            platform: info.platform.to_string(),
            registration_status: status,
            avg_post_reach: info.avg_post_reach,
            er_percent: info.er_percent,
        }
    }

    /// Cells of this row, optionally with the engagement columns.
    pub fn to_record(&self, with_engagement: bool) -> Vec<String> {
        let mut record = vec![
            self.channel_name.clone(),
            self.followers_count.clone(),
            self.original_link.clone(),
            self.platform.clone(),
            self.registration_status.label().to_string(),
        ];
        if with_engagement {
            record.push(format!("{:.2}", self.avg_post_reach));
            record.push(format!("{:.2}", self.er_percent));
        }
        record
    }
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub link_count: usize,
    pub cache_hits: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub checked: usize,
    pub registered: usize,
    pub check_failures: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn elapsed_secs(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
}

/// Rows in submission order plus run statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub rows: Vec<ResultRow>,
    pub with_engagement: bool,
    pub stats: RunStats,
}

impl Report {
    /// Header cells for this report.
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = HEADER.iter().map(|s| s.to_string()).collect();
        if self.with_engagement {
            header.extend(ENGAGEMENT_HEADER.iter().map(|s| s.to_string()));
        }
        header
    }

    /// Header followed by every data row.
    pub fn records(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header())
            .chain(self.rows.iter().map(|r| r.to_record(self.with_engagement)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;

    fn sample_row() -> ResultRow {
        let mut info = ChannelInfo::new("a", "50000", "t.me/a");
        info.platform = Platform::Telegram;
        info.avg_post_reach = 1234.5;
        info.er_percent = 3.14159;
        ResultRow::finalize(&info, RegistrationStatus::Registered)
    }

    #[test]
    fn test_record_without_engagement() {
        let record = sample_row().to_record(false);
        assert_eq!(record, vec!["a", "50000", "t.me/a", "telegram", "registered"]);
    }

    #[test]
    fn test_record_with_engagement_two_decimals() {
        let record = sample_row().to_record(true);
        assert_eq!(record[5], "1234.50");
        assert_eq!(record[6], "3.14");
    }

    #[test]
    fn test_records_header_first() {
        let report = Report {
            rows: vec![sample_row(), sample_row()],
            with_engagement: true,
            stats: RunStats::default(),
        };
        let records = report.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0][0], "Channel Name");
        assert_eq!(records[0].len(), 7);
    }
}
