//! Keyword search migration between two `Web Data` databases
//!
//! Chrome stores omnibox keywords (custom search engines) in the `keywords`
//! table of `<profile>/Web Data`. Built-in engines carry a non-zero
//! `prepopulate_id`; only user-created rows are merged, and rows already
//! present in the destination (matched by `keyword`) are never touched.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Database file holding keyword searches inside a profile directory
pub const WEB_DATA_FILE: &str = "Web Data";

const KEYWORDS_TABLE: &str = "keywords";

/// Columns carried over for each keyword, in insert order
const KEYWORD_COLUMNS: [&str; 8] = [
    "keyword",
    "short_name",
    "favicon_url",
    "url",
    "safe_for_autoreplace",
    "usage_count",
    "date_created",
    "last_modified",
];

/// Fatal keyword migration errors
///
/// Any of these stops the merge before the destination is modified.
#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("keyword store unavailable at {}: {reason}", .path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("failed to read keywords from {}: {source}", .path.display())]
    QueryFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to commit keywords to {}: {source}", .path.display())]
    CommitFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to copy keywords table into {}: {source}", .path.display())]
    BulkCopyFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

/// A single row that could not be migrated; the rest of the batch continues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("'{keyword}': {reason}")]
pub struct RecordInsertFailed {
    pub keyword: String,
    pub reason: String,
}

/// One custom search engine entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub short_name: String,
    pub favicon_url: String,
    pub url: String,
    pub safe_for_autoreplace: Option<i64>,
    pub usage_count: Option<i64>,
    pub date_created: Option<i64>,
    pub last_modified: Option<i64>,
}

impl KeywordRecord {
    /// Build a record from a row selected with `KEYWORD_COLUMNS`
    fn from_values(values: &[Value]) -> Result<Self, String> {
        Ok(Self {
            keyword: text_at(values, 0)?,
            short_name: text_at(values, 1)?,
            favicon_url: text_at(values, 2)?,
            url: text_at(values, 3)?,
            safe_for_autoreplace: integer_at(values, 4)?,
            usage_count: integer_at(values, 5)?,
            date_created: integer_at(values, 6)?,
            last_modified: integer_at(values, 7)?,
        })
    }
}

fn text_at(values: &[Value], index: usize) -> Result<String, String> {
    match values.get(index) {
        Some(Value::Text(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(format!("missing {}", KEYWORD_COLUMNS[index])),
        Some(other) => Err(format!(
            "{} is {}, expected text",
            KEYWORD_COLUMNS[index],
            other.data_type()
        )),
    }
}

/// Integer columns are nullable in Chrome's schema; NULL is carried over as-is
fn integer_at(values: &[Value], index: usize) -> Result<Option<i64>, String> {
    match values.get(index) {
        Some(Value::Integer(n)) => Ok(Some(*n)),
        Some(Value::Null) => Ok(None),
        None => Err(format!("missing {}", KEYWORD_COLUMNS[index])),
        Some(other) => Err(format!(
            "{} is {}, expected integer",
            KEYWORD_COLUMNS[index],
            other.data_type()
        )),
    }
}

/// How the destination was populated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Per-row merge of custom keywords into an existing table
    #[default]
    Merge,
    /// Destination had no keywords; the whole source table was copied
    BulkCopy,
}

/// A keyword written to the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedKeyword {
    pub keyword: String,
    pub short_name: String,
}

/// Per-row outcomes of a merge, in source order
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub mode: MergeMode,
    pub migrated: Vec<MigratedKeyword>,
    pub skipped: Vec<String>,
    pub failed: Vec<RecordInsertFailed>,
}

impl MergeReport {
    /// Number of source rows accounted for
    pub fn total(&self) -> usize {
        self.migrated.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn fail(&mut self, keyword: String, reason: impl Display) {
        let failure = RecordInsertFailed {
            keyword,
            reason: reason.to_string(),
        };
        warn!("keyword not migrated {failure}");
        self.failed.push(failure);
    }
}

/// Merge options
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Read from a temporary copy of the source instead of the live file
    pub snapshot_source: bool,
}

/// Path of the keyword database inside a profile directory
pub fn web_data_path(profile_dir: &Path) -> PathBuf {
    profile_dir.join(WEB_DATA_FILE)
}

/// Merge custom keyword searches from `source_db` into `dest_db`
///
/// - Missing destination file: the source database is copied whole.
/// - Destination without a `keywords` table: the full source table
///   (prepopulated engines included) is recreated in one transaction.
/// - Otherwise each non-prepopulated source row is inserted unless its
///   `keyword` already exists in the destination. Inserts are committed
///   together, and only if at least one succeeded.
pub fn merge_keywords(
    source_db: &Path,
    dest_db: &Path,
    options: &MergeOptions,
) -> Result<MergeReport, KeywordError> {
    if !source_db.is_file() {
        return Err(unavailable(source_db, "file not found"));
    }

    // Declared before `source` so the connection is closed first
    let snapshot = if options.snapshot_source {
        Some(snapshot(source_db)?)
    } else {
        None
    };
    let source_file = snapshot.as_ref().map_or(source_db, |s| s.path());

    let source = open_store(
        source_file,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| unavailable(source_db, e))?;

    if !dest_db.exists() {
        return bulk_copy_file(&source, source_file, source_db, dest_db);
    }

    let mut dest = open_store(
        dest_db,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| unavailable(dest_db, e))?;

    if !has_table(&dest, KEYWORDS_TABLE).map_err(|e| unavailable(dest_db, e))? {
        return bulk_copy_table(&source, source_db, &mut dest, dest_db);
    }

    merge_custom_keywords(&source, source_db, &dest, dest_db)
}

/// Count user-created keywords in a `Web Data` file (0 if it does not exist)
pub fn count_custom_keywords(web_data: &Path) -> Result<usize, KeywordError> {
    if !web_data.is_file() {
        return Ok(0);
    }

    let conn = open_store(
        web_data,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| unavailable(web_data, e))?;

    if !has_table(&conn, KEYWORDS_TABLE).map_err(|e| query_failed(web_data, e))? {
        return Ok(0);
    }

    let sql = custom_keywords_sql(&conn).map_err(|e| query_failed(web_data, e))?;
    let (_, rows) = read_rows(&conn, &sql).map_err(|e| query_failed(web_data, e))?;
    Ok(rows.len())
}

fn merge_custom_keywords(
    source: &Connection,
    source_db: &Path,
    dest: &Connection,
    dest_db: &Path,
) -> Result<MergeReport, KeywordError> {
    let sql = custom_keywords_sql(source).map_err(|e| query_failed(source_db, e))?;
    let (_, rows) = read_rows(source, &sql).map_err(|e| query_failed(source_db, e))?;
    debug!(count = rows.len(), "read custom keywords from source");

    let mut report = MergeReport::default();
    let mut transaction = None;

    for (index, values) in rows.iter().enumerate() {
        let record = match KeywordRecord::from_values(values) {
            Ok(record) => record,
            Err(reason) => {
                report.fail(row_label(values, index), reason);
                continue;
            }
        };

        // Checked per row so repeated source keywords see earlier inserts
        match keyword_exists(dest, &record.keyword) {
            Ok(true) => {
                debug!(keyword = %record.keyword, "keyword already exists, skipping");
                report.skipped.push(record.keyword);
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                report.fail(record.keyword, e);
                continue;
            }
        }

        if transaction.is_none() {
            let tx = dest
                .unchecked_transaction()
                .map_err(|e| unavailable(dest_db, e))?;
            transaction = Some(tx);
        }

        match insert_record(dest, &record) {
            Ok(_) => {
                debug!(keyword = %record.keyword, "keyword inserted");
                report.migrated.push(MigratedKeyword {
                    keyword: record.keyword,
                    short_name: record.short_name,
                });
            }
            Err(e) => report.fail(record.keyword, e),
        }
    }

    if let Some(tx) = transaction {
        if report.migrated.is_empty() {
            if let Err(e) = tx.rollback() {
                warn!("rollback of empty keyword batch failed: {e}");
            }
        } else {
            tx.commit().map_err(|source| KeywordError::CommitFailed {
                path: dest_db.to_path_buf(),
                source,
            })?;
            info!(
                count = report.migrated.len(),
                "committed keywords to {}",
                dest_db.display()
            );
        }
    }

    Ok(report)
}

/// Destination file is absent: copy the source database as-is
fn bulk_copy_file(
    source: &Connection,
    source_file: &Path,
    source_db: &Path,
    dest_db: &Path,
) -> Result<MergeReport, KeywordError> {
    let migrated = read_keyword_labels(source).map_err(|e| query_failed(source_db, e))?;

    fs::copy(source_file, dest_db).map_err(|e| unavailable(dest_db, e))?;
    info!(
        "copied {} to {} ({} keywords)",
        source_db.display(),
        dest_db.display(),
        migrated.len()
    );

    Ok(MergeReport {
        mode: MergeMode::BulkCopy,
        migrated,
        ..Default::default()
    })
}

/// Destination database has no keywords table: recreate it from the source
fn bulk_copy_table(
    source: &Connection,
    source_db: &Path,
    dest: &mut Connection,
    dest_db: &Path,
) -> Result<MergeReport, KeywordError> {
    let dump = dump_keywords_table(source).map_err(|e| query_failed(source_db, e))?;

    restore_keywords_table(dest, &dump).map_err(|source| KeywordError::BulkCopyFailed {
        path: dest_db.to_path_buf(),
        source,
    })?;
    info!(
        count = dump.rows.len(),
        "recreated keywords table in {}",
        dest_db.display()
    );

    Ok(MergeReport {
        mode: MergeMode::BulkCopy,
        migrated: dump.labels(),
        ..Default::default()
    })
}

/// Full copy of the source `keywords` table
struct TableDump {
    create_sql: String,
    index_sql: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TableDump {
    fn labels(&self) -> Vec<MigratedKeyword> {
        let keyword = self.columns.iter().position(|c| c == "keyword");
        let short_name = self.columns.iter().position(|c| c == "short_name");
        let text = |row: &[Value], index: Option<usize>| match index.and_then(|i| row.get(i)) {
            Some(Value::Text(s)) => s.clone(),
            _ => String::new(),
        };

        self.rows
            .iter()
            .map(|row| MigratedKeyword {
                keyword: text(row, keyword),
                short_name: text(row, short_name),
            })
            .collect()
    }
}

fn dump_keywords_table(conn: &Connection) -> rusqlite::Result<TableDump> {
    let create_sql: String = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [KEYWORDS_TABLE],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT sql FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL",
    )?;
    let index_sql = stmt
        .query_map([KEYWORDS_TABLE], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    let (columns, rows) = read_rows(conn, &format!("SELECT * FROM {KEYWORDS_TABLE} ORDER BY rowid"))?;

    Ok(TableDump {
        create_sql,
        index_sql,
        columns,
        rows,
    })
}

fn restore_keywords_table(dest: &mut Connection, dump: &TableDump) -> rusqlite::Result<()> {
    let tx = dest.transaction()?;
    tx.execute_batch(&dump.create_sql)?;
    for sql in &dump.index_sql {
        tx.execute_batch(sql)?;
    }

    {
        let columns = dump
            .columns
            .iter()
            .map(|c| format!("\"{}\"", c.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; dump.columns.len()].join(", ");
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {KEYWORDS_TABLE} ({columns}) VALUES ({placeholders})"
        ))?;
        for row in &dump.rows {
            insert.execute(params_from_iter(row))?;
        }
    }

    tx.commit()
}

/// SELECT for user-created keywords; tables without `prepopulate_id` have none built in
fn custom_keywords_sql(conn: &Connection) -> rusqlite::Result<String> {
    let filter = if has_column(conn, KEYWORDS_TABLE, "prepopulate_id")? {
        " WHERE IFNULL(prepopulate_id, 0) = 0"
    } else {
        ""
    };

    Ok(format!(
        "SELECT {} FROM {KEYWORDS_TABLE}{filter} ORDER BY rowid",
        KEYWORD_COLUMNS.join(", ")
    ))
}

/// Run a query and collect every row as raw values, with the column names
fn read_rows(conn: &Connection, sql: &str) -> rusqlite::Result<(Vec<String>, Vec<Vec<Value>>)> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<Value>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok((columns, rows))
}

fn read_keyword_labels(conn: &Connection) -> rusqlite::Result<Vec<MigratedKeyword>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT keyword, short_name FROM {KEYWORDS_TABLE} ORDER BY rowid"
    ))?;
    let labels = stmt
        .query_map([], |row| {
            Ok(MigratedKeyword {
                keyword: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                short_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?
        .collect();
    labels
}

fn keyword_exists(conn: &Connection, keyword: &str) -> rusqlite::Result<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {KEYWORDS_TABLE} WHERE keyword = ?1 LIMIT 1"),
            [keyword],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn insert_record(conn: &Connection, record: &KeywordRecord) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT INTO {KEYWORDS_TABLE} ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            KEYWORD_COLUMNS.join(", ")
        ),
        params![
            record.keyword,
            record.short_name,
            record.favicon_url,
            record.url,
            record.safe_for_autoreplace,
            record.usage_count,
            record.date_created,
            record.last_modified,
        ],
    )
}

fn has_table(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let mut rows = stmt.query([name])?;
    Ok(rows.next()?.is_some())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Open a database and touch its schema so a non-database file fails here
fn open_store(path: &Path, flags: OpenFlags) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(path, flags)?;
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(conn)
}

fn snapshot(source_db: &Path) -> Result<NamedTempFile, KeywordError> {
    let temp = tempfile::Builder::new()
        .prefix("web-data-")
        .suffix(".db")
        .tempfile()
        .map_err(|e| unavailable(source_db, e))?;
    fs::copy(source_db, temp.path()).map_err(|e| unavailable(source_db, e))?;
    debug!(
        "reading {} through snapshot {}",
        source_db.display(),
        temp.path().display()
    );
    Ok(temp)
}

fn row_label(values: &[Value], index: usize) -> String {
    match values.first() {
        Some(Value::Text(keyword)) => keyword.clone(),
        _ => format!("<row {}>", index + 1),
    }
}

fn unavailable(path: &Path, reason: impl Display) -> KeywordError {
    KeywordError::StoreUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn query_failed(path: &Path, source: rusqlite::Error) -> KeywordError {
    KeywordError::QueryFailed {
        path: path.to_path_buf(),
        source,
    }
}
