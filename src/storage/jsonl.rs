//! JSONL (JSON Lines) storage.
//!
//! Every table in the data directory is a JSONL file: one JSON object per
//! line, one line per row.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::StorageError;

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn write_lines(file: File, entities: &[T]) -> Result<usize, StorageError> {
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(count)
    }

    /// Append multiple entities to the file.
    ///
    /// All lines are serialized before anything is written, so a
    /// serialization failure leaves the file untouched. A torn last line
    /// left by an interrupted append is terminated first so it cannot
    /// swallow the first new row.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }

        self.ensure_dir()?;

        let mut buffer = String::new();
        for entity in entities {
            buffer.push_str(&serde_json::to_string(entity)?);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        if !Self::ends_with_newline(&mut file)? {
            warn!("Terminating partial last line in {:?}", self.path);
            buffer.insert(0, '\n');
        }
        file.write_all(buffer.as_bytes())?;
        file.sync_all()?;

        info!("Appended {} entities to {:?}", entities.len(), self.path);
        Ok(entities.len())
    }

    /// True for an empty file or one whose last byte is a newline.
    fn ends_with_newline(file: &mut File) -> Result<bool, StorageError> {
        if file.metadata()?.len() == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let count = Self::write_lines(File::create(&self.path)?, entities)?;
        info!("Wrote {} entities to {:?}", count, self.path);

        Ok(count)
    }

    /// Write entities to a file that must not exist yet.
    ///
    /// Rows are staged in a sibling temp file and then hard-linked into
    /// place, so the target appears with every row or not at all. If the
    /// target already exists the error is `io::ErrorKind::AlreadyExists`.
    pub fn write_new(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let staging = self.staging_path();
        let result = File::create(&staging)
            .map_err(StorageError::from)
            .and_then(|file| Self::write_lines(file, entities))
            .and_then(|count| {
                fs::hard_link(&staging, &self.path)?;
                Ok(count)
            });

        if let Err(e) = fs::remove_file(&staging) {
            warn!("Failed to remove staging file {:?}: {}", staging, e);
        }

        let count = result?;
        info!("Published {} entities to {:?}", count, self.path);
        Ok(count)
    }

    fn staging_path(&self) -> PathBuf {
        let seq = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{}.{}-{}.tmp", name, std::process::id(), seq))
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Read all entities from the file.
    ///
    /// A missing file reads as empty. Lines that fail to parse are logged
    /// and skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        idx + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }

    /// Read entities matching a predicate.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(predicate).collect())
    }

    /// Count non-empty lines in the file.
    pub fn count(&self) -> Result<usize, StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: u64,
        team: String,
        wins: u32,
    }

    fn row(id: u64, team: &str, wins: u32) -> Row {
        Row {
            id,
            team: team.to_string(),
            wins,
        }
    }

    #[test]
    fn test_jsonl_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rows.jsonl");
        let rows = vec![row(1, "Boston Celtics", 3), row(2, "Miami Heat", 1)];

        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());
        assert_eq!(writer.write_all(&rows).unwrap(), 2);

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        assert_eq!(reader.read_all().unwrap(), rows);
    }

    #[test]
    fn test_jsonl_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let reader: JsonlReader<Row> = JsonlReader::new(temp_dir.path().join("missing.jsonl"));

        assert!(reader.read_all().unwrap().is_empty());
        assert_eq!(reader.count().unwrap(), 0);
    }

    #[test]
    fn test_append_batch_accumulates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/games.jsonl");

        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());
        assert_eq!(writer.append_batch(&[row(1, "A", 0)]).unwrap(), 1);
        assert_eq!(writer.append_batch(&[row(2, "B", 0), row(3, "C", 0)]).unwrap(), 2);
        assert_eq!(writer.append_batch(&[]).unwrap(), 0);

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        let ids: Vec<u64> = reader.read_all().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(reader.count().unwrap(), 3);
    }

    #[test]
    fn test_append_after_torn_line_keeps_new_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("torn.jsonl");

        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());
        writer.append_batch(&[row(1, "A", 1)]).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"id\":2,\"te").unwrap();
        drop(file);

        writer.append_batch(&[row(3, "C", 3), row(4, "D", 4)]).unwrap();

        let ids: Vec<u64> = JsonlReader::<Row>::new(path)
            .read_all()
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_read_where() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("filter.jsonl");

        JsonlWriter::new(path.clone())
            .write_all(&[row(1, "A", 50), row(2, "B", 150), row(3, "C", 250)])
            .unwrap();

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        let filtered = reader.read_where(|r| r.wins > 100).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].team, "B");
        assert_eq!(filtered[1].team, "C");
    }

    #[test]
    fn test_write_all_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("overwrite.jsonl");

        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());
        writer.write_all(&[row(1, "Old", 1)]).unwrap();
        writer.write_all(&[row(2, "New", 2)]).unwrap();

        let read = JsonlReader::<Row>::new(path).read_all().unwrap();
        assert_eq!(read, vec![row(2, "New", 2)]);
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");

        std::fs::write(
            &path,
            r#"{"id":1,"team":"Good","wins":1}
not-valid-json

{"id":2,"team":"Also Good","wins":2}
"#,
        )
        .unwrap();

        let reader: JsonlReader<Row> = JsonlReader::new(path);
        let rows = reader.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].team, "Also Good");
    }

    #[test]
    fn test_write_new_publishes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snapshots/2024-10-24.jsonl");

        let writer: JsonlWriter<Row> = JsonlWriter::new(path.clone());
        assert_eq!(writer.write_new(&[row(1, "A", 1), row(2, "B", 0)]).unwrap(), 2);

        let err = writer.write_new(&[row(3, "C", 4)]).unwrap_err();
        match err {
            StorageError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
            other => panic!("unexpected error: {other}"),
        }

        // First publication is untouched and no staging files are left behind
        let rows = JsonlReader::<Row>::new(path.clone()).read_all().unwrap();
        assert_eq!(rows.len(), 2);
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
