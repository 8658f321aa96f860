//! Append-only audit log of task status changes.

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::{LogEntry, TaskStatus};
use crate::store::{Record, RecordStore};

pub const LOGS_HEADER: &str = "Task_Code,Rep_User_Code,Status,Change_Date";

/// Dates are written as ISO calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct LogRepository<S> {
    store: S,
}

impl<S: RecordStore> LogRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn save(&self, entry: &LogEntry) -> Result<()> {
        self.store.append(&[
            entry.task_code.to_string(),
            entry.user_code.to_string(),
            entry.status.code().to_string(),
            entry.date.format(DATE_FORMAT).to_string(),
        ])
    }

    /// Entries for one task, oldest first.
    pub fn find_by_task_code(&self, task_code: i64) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        for record in self.store.read_all()? {
            if record.int(0, "Task_Code")? == task_code {
                entries.push(entry_from_record(&record)?);
            }
        }
        Ok(entries)
    }
}

fn entry_from_record(record: &Record) -> Result<LogEntry> {
    let raw_status = record.int(2, "Status")?;
    let status = TaskStatus::from_code(raw_status)
        .ok_or_else(|| record.parse_error(format!("unknown status {raw_status}")))?;
    let raw_date = record.text(3, "Change_Date")?;
    let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|err| {
        record.parse_error(format!("column Change_Date: '{raw_date}' is not a date ({err})"))
    })?;
    Ok(LogEntry {
        task_code: record.int(0, "Task_Code")?,
        user_code: record.int(1, "Rep_User_Code")?,
        status,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn save_writes_iso_date() {
        let store = MemoryStore::new("logs", LOGS_HEADER);
        let logs = LogRepository::new(store.clone());

        logs.save(&LogEntry {
            task_code: 100,
            user_code: 1,
            status: TaskStatus::NotStarted,
            date: date(2024, 3, 7),
        })
        .expect("save");

        assert_eq!(store.lines(), vec!["100,1,0,2024-03-07"]);
    }

    #[test]
    fn history_filters_by_task_and_keeps_order() {
        let store = MemoryStore::new("logs", LOGS_HEADER).with_lines(&[
            "100,1,0,2024-03-07",
            "101,2,0,2024-03-07",
            "100,2,1,2024-03-08",
            "100,1,2,2024-03-09",
        ]);
        let logs = LogRepository::new(store);

        let history = logs.find_by_task_code(100).expect("history");
        let statuses: Vec<_> = history.iter().map(|entry| entry.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::NotStarted, TaskStatus::InProgress, TaskStatus::Done]
        );
        assert_eq!(history[1].user_code, 2);
        assert_eq!(history[2].date, date(2024, 3, 9));
        assert!(logs.find_by_task_code(999).expect("empty").is_empty());
    }

    #[test]
    fn malformed_date_is_parse_error() {
        let store = MemoryStore::new("logs", LOGS_HEADER).with_lines(&["100,1,0,07/03/2024"]);
        let err = LogRepository::new(store)
            .find_by_task_code(100)
            .expect_err("bad date");
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }
}
