//! JSON Lines persistence of change records.
//!
//! One serialized [`Record`] per line, oldest first.

use crate::error::{ChangeError, Result};
use crate::record::Record;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

/// Appends `records` to the journal at `path`, creating it if needed.
pub fn append_records(path: &Path, records: &[Record]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            ChangeError::Io(io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;

    let mut buffer = String::new();
    for record in records {
        buffer.push_str(&serde_json::to_string(record)?);
        buffer.push('\n');
    }
    file.write_all(buffer.as_bytes())?;
    file.sync_all()?;

    log::debug!("Appended {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Reads every record from the journal. A missing journal is empty.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ChangeError::Io(io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            )));
        }
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            log::error!("{}:{}: {}", path.display(), index + 1, e);
            ChangeError::Json(e)
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Truncates the journal. A missing journal is left missing.
pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        fs::write(path, "")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;
    use tempfile::TempDir;

    const ROOT: [&str; 0] = [];

    #[test]
    fn test_missing_journal_is_empty() {
        let temp = TempDir::new().unwrap();
        let records = load_records(&temp.path().join("none.jsonl")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_append_then_load_keeps_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("journal.jsonl");

        let first = vec![Change::create_folder(&ROOT, "a").unwrap().encode()];
        let second = vec![
            Change::create_file(&["a"], "b.json").unwrap().encode(),
            Change::rename_file(&["a"], "b.json", "c.json")
                .unwrap()
                .encode(),
        ];
        append_records(&path, &first).unwrap();
        append_records(&path, &second).unwrap();

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0], first[0]);
        assert_eq!(loaded[2], second[1]);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_clear_truncates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("journal.jsonl");
        append_records(&path, &[Change::create_folder(&ROOT, "a").unwrap().encode()]).unwrap();

        clear(&path).unwrap();
        assert!(load_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_line_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("journal.jsonl");
        fs::write(&path, "{\"classId\":1,\"parent\":\"\",\"name\":\"a\"}\nnot json\n").unwrap();

        assert!(matches!(load_records(&path), Err(ChangeError::Json(_))));
    }
}
