//! Record store for taskapp
//!
//! Every entity type (users, tasks, log entries) lives in its own flat file:
//!
//! ```text
//! Code,Name,Status,Rep_User_Code     # exactly one header line
//! 100,Design,0,1                     # one record per line
//! 101,Review,2,2
//! ```
//!
//! Fields are separated by a single comma. There is no quoting or escaping,
//! so a value can never contain the delimiter or a line break; writes reject
//! such values instead of corrupting the file.
//!
//! The format has no random-access update, so the store exposes exactly three
//! primitives: read everything, append one line, rewrite everything.

use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Field delimiter shared by all stores
pub const DELIMITER: char = ',';

/// One parsed line of a store, header excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    origin: Arc<Path>,
    /// 1-based line number in the backing file
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn new(origin: Arc<Path>, line: usize, fields: Vec<String>) -> Self {
        Self {
            origin,
            line,
            fields,
        }
    }

    /// Text value of a column
    pub fn text(&self, idx: usize, column: &str) -> Result<&str> {
        self.fields
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| self.parse_error(format!("missing column {column}")))
    }

    /// Integer value of a column
    pub fn int(&self, idx: usize, column: &str) -> Result<i64> {
        let raw = self.text(idx, column)?;
        raw.parse::<i64>().map_err(|err| {
            self.parse_error(format!("column {column}: '{raw}' is not an integer ({err})"))
        })
    }

    /// The first-column key every store is indexed by
    pub fn code(&self) -> Result<i64> {
        self.int(0, "Code")
    }

    pub fn parse_error(&self, reason: impl Into<String>) -> Error {
        Error::Parse {
            path: self.origin.to_path_buf(),
            line: self.line,
            reason: reason.into(),
        }
    }
}

/// Read/append/rewrite access to the records of one entity type.
///
/// Each `read_all` call reads the backing data from scratch; there is no
/// cursor or cache between calls.
pub trait RecordStore {
    /// Where the records live, for error messages and logs
    fn location(&self) -> &Path;

    /// The header line, columns joined by [`DELIMITER`]
    fn header(&self) -> &str;

    /// All records in stored order
    fn read_all(&self) -> Result<Vec<Record>>;

    /// Add one record after the existing ones
    fn append(&self, fields: &[String]) -> Result<()>;

    /// Replace the whole store with `header` followed by `records` in order
    fn rewrite(&self, header: &str, records: &[Vec<String>]) -> Result<()>;

    /// Number of columns declared by the header
    fn columns(&self) -> usize {
        column_count(self.header())
    }
}

fn column_count(header: &str) -> usize {
    header.split(DELIMITER).count()
}

fn split_line(line: &str) -> Vec<String> {
    line.split(DELIMITER)
        .map(|field| field.trim().to_string())
        .collect()
}

/// Check that a row can be written without breaking the format.
pub fn validate_fields(fields: &[String], columns: usize) -> Result<()> {
    if fields.len() != columns {
        return Err(Error::InvalidArgument(format!(
            "expected {columns} fields, got {}",
            fields.len()
        )));
    }
    for field in fields {
        if field.contains(DELIMITER) || field.contains('\n') || field.contains('\r') {
            return Err(Error::InvalidArgument(format!(
                "value '{}' cannot contain '{DELIMITER}' or line breaks",
                field.escape_debug()
            )));
        }
        // Reads trim every field, so padded values would not read back as written.
        if field.trim() != field {
            return Err(Error::InvalidArgument(format!(
                "value '{}' cannot start or end with whitespace",
                field.escape_debug()
            )));
        }
    }
    Ok(())
}

fn join_fields(fields: &[String]) -> String {
    fields.join(&DELIMITER.to_string())
}

// =========================================================================
// File-backed store
// =========================================================================

/// Store backed by a delimited text file
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    path: Arc<Path>,
    header: String,
}

impl FlatFileStore {
    pub fn new(path: impl Into<PathBuf>, header: impl Into<String>) -> Self {
        let path: PathBuf = path.into();
        Self {
            path: Arc::from(path),
            header: header.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create the file with its header line if it does not exist yet.
    ///
    /// Returns whether the file was created.
    pub fn init(&self) -> Result<bool> {
        if self.path.exists() {
            if !self.path.is_file() {
                return Err(Error::InvalidConfig(format!(
                    "store path exists but is not a file: {}",
                    self.path.display()
                )));
            }
            return Ok(false);
        }

        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|err| Error::store(&parent, err))?;
        fs::write(&self.path, format!("{}\n", self.header))
            .map_err(|err| Error::store(self.path.as_ref(), err))?;
        tracing::debug!(path = %self.path.display(), "created store");
        Ok(true)
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn io_error(&self, err: io::Error) -> Error {
        Error::store(self.path.as_ref(), err)
    }

    fn parse_error(&self, line: usize, reason: impl Into<String>) -> Error {
        Error::Parse {
            path: self.path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}

/// How the file currently ends, which decides what an append must write first
enum Tail {
    Empty,
    Newline,
    Unterminated,
}

fn tail(file: &mut File) -> io::Result<Tail> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(Tail::Empty);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(if last[0] == b'\n' {
        Tail::Newline
    } else {
        Tail::Unterminated
    })
}

fn header_matches(found: &str, expected: &str) -> bool {
    let found = split_line(found.trim_start_matches('\u{feff}'));
    let expected = split_line(expected);
    found.len() == expected.len()
        && found
            .iter()
            .zip(&expected)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

impl RecordStore for FlatFileStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn header(&self) -> &str {
        &self.header
    }

    fn read_all(&self) -> Result<Vec<Record>> {
        let content = fs::read_to_string(&self.path).map_err(|err| self.io_error(err))?;
        let mut lines = content.lines().enumerate();

        let header = match lines.next() {
            Some((_, header)) if !header.trim().is_empty() => header,
            _ => return Err(self.parse_error(1, "missing header line")),
        };
        let columns = self.columns();
        if !header_matches(header, &self.header) {
            return Err(self.parse_error(
                1,
                format!("header '{header}' does not match '{}'", self.header),
            ));
        }

        let mut records = Vec::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_line(line);
            if fields.len() != columns {
                return Err(self.parse_error(
                    idx + 1,
                    format!("expected {columns} fields, found {}", fields.len()),
                ));
            }
            records.push(Record::new(Arc::clone(&self.path), idx + 1, fields));
        }

        tracing::debug!(path = %self.path.display(), records = records.len(), "read store");
        Ok(records)
    }

    fn append(&self, fields: &[String]) -> Result<()> {
        validate_fields(fields, self.columns())?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.io_error(err))?;

        let mut line = String::new();
        match tail(&mut file).map_err(|err| self.io_error(err))? {
            Tail::Empty => {
                line.push_str(&self.header);
                line.push('\n');
            }
            Tail::Unterminated => line.push('\n'),
            Tail::Newline => {}
        }
        line.push_str(&join_fields(fields));
        line.push('\n');

        file.write_all(line.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|err| self.io_error(err))?;

        tracing::debug!(path = %self.path.display(), "appended record");
        Ok(())
    }

    /// Rewrites through a sibling temp file renamed over the target, so a
    /// crash leaves either the old or the new content on disk.
    fn rewrite(&self, header: &str, records: &[Vec<String>]) -> Result<()> {
        let columns = column_count(header);
        for fields in records {
            validate_fields(fields, columns)?;
        }

        let parent = self.parent_dir();
        let temp = NamedTempFile::new_in(&parent).map_err(|err| self.io_error(err))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            writeln!(writer, "{header}").map_err(|err| self.io_error(err))?;
            for fields in records {
                writeln!(writer, "{}", join_fields(fields)).map_err(|err| self.io_error(err))?;
            }
            writer.flush().map_err(|err| self.io_error(err))?;
        }
        // The temp file is created owner-only; keep the target's mode instead.
        match fs::metadata(&self.path) {
            Ok(meta) => temp
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(|err| self.io_error(err))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(self.io_error(err)),
        }
        temp.as_file()
            .sync_all()
            .map_err(|err| self.io_error(err))?;
        temp.persist(self.path.as_ref())
            .map_err(|err| self.io_error(err.error))?;

        tracing::debug!(
            path = %self.path.display(),
            records = records.len(),
            "rewrote store"
        );
        Ok(())
    }
}

// =========================================================================
// In-memory store
// =========================================================================

/// Store kept in process memory.
///
/// Clones share the same rows, so several repositories can be built over
/// one logical store.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    name: Arc<Path>,
    header: String,
    rows: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MemoryStore {
    pub fn new(name: &str, header: impl Into<String>) -> Self {
        Self {
            name: Arc::from(PathBuf::from(format!("memory:{name}"))),
            header: header.into(),
            rows: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Seed the store with rows given as delimited lines
    pub fn with_lines(self, lines: &[&str]) -> Self {
        self.rows
            .borrow_mut()
            .extend(lines.iter().map(|line| split_line(line)));
        self
    }

    /// Stored rows rendered as delimited lines
    pub fn lines(&self) -> Vec<String> {
        self.rows.borrow().iter().map(|row| join_fields(row)).collect()
    }
}

impl RecordStore for MemoryStore {
    fn location(&self) -> &Path {
        &self.name
    }

    fn header(&self) -> &str {
        &self.header
    }

    fn read_all(&self) -> Result<Vec<Record>> {
        let columns = self.columns();
        let rows = self.rows.borrow();
        let mut records = Vec::with_capacity(rows.len());
        for (idx, fields) in rows.iter().enumerate() {
            // Line 1 is the header.
            let line = idx + 2;
            if fields.len() != columns {
                return Err(Error::Parse {
                    path: self.name.to_path_buf(),
                    line,
                    reason: format!("expected {columns} fields, found {}", fields.len()),
                });
            }
            records.push(Record::new(Arc::clone(&self.name), line, fields.clone()));
        }
        Ok(records)
    }

    fn append(&self, fields: &[String]) -> Result<()> {
        validate_fields(fields, self.columns())?;
        self.rows.borrow_mut().push(fields.to_vec());
        Ok(())
    }

    fn rewrite(&self, header: &str, records: &[Vec<String>]) -> Result<()> {
        if header != self.header {
            return Err(Error::InvalidArgument(format!(
                "header '{header}' does not match '{}'",
                self.header
            )));
        }
        for fields in records {
            validate_fields(fields, self.columns())?;
        }
        *self.rows.borrow_mut() = records.to_vec();
        Ok(())
    }
}
