//! Parent repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and batch lookup APIs over the `parent` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Parent::validate()` before any SQL mutation.
//! - `save_all` is all-or-nothing and preserves input order in its output.
//! - Misses on read and delete are empty results, never errors.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::parent::{
    Parent, ParentId, ParentValidationError, PARENT_COLUMNS, PARENT_TABLE,
};
use log::{debug, error, info};
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const PARENT_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    age
FROM parent";

// Stays well below SQLITE_MAX_VARIABLE_NUMBER on every supported build.
const ID_LIST_CHUNK_SIZE: usize = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for parent persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Field constraints violated before reaching the store.
    Validation(ParentValidationError),
    /// Store-level failure (connectivity, constraint violation).
    Db(DbError),
    /// `update` targeted an id with no row.
    NotFound(ParentId),
    /// `update` was handed an unsaved parent.
    MissingId,
    /// `save` was handed a parent that already carries an id.
    AlreadyPersisted(ParentId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Live `NOT NULL` flag disagrees with `ColumnMapping::nullable`.
    ColumnNullabilityMismatch {
        table: &'static str,
        column: &'static str,
        expected_nullable: bool,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid parent: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "parent not found: {id}"),
            Self::MissingId => write!(f, "parent has no id; save it before updating"),
            Self::AlreadyPersisted(id) => {
                write!(f, "parent {id} is already persisted; use update instead")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted parent data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
            Self::ColumnNullabilityMismatch {
                table,
                column,
                expected_nullable,
            } => {
                let expected = if *expected_nullable { "nullable" } else { "NOT NULL" };
                write!(f, "column `{table}.{column}` must be {expected}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParentValidationError> for RepoError {
    fn from(value: ParentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for parent CRUD operations.
pub trait ParentRepository {
    /// Inserts an unsaved parent and returns it with the assigned id.
    fn save(&self, parent: &Parent) -> RepoResult<Parent>;
    /// Inserts every parent in one transaction; output order matches input.
    fn save_all(&mut self, parents: &[Parent]) -> RepoResult<Vec<Parent>>;
    fn find_by_id(&self, id: ParentId) -> RepoResult<Option<Parent>>;
    /// Returns the rows matching `ids`, ordered by id. Unknown ids are skipped.
    fn find_by_id_in_list(&self, ids: &[ParentId]) -> RepoResult<Vec<Parent>>;
    fn find_all(&self) -> RepoResult<Vec<Parent>>;
    /// Overwrites all mutable fields of an existing row.
    fn update(&self, parent: &Parent) -> RepoResult<Parent>;
    /// Removes the row if present. Missing ids are a no-op.
    fn delete_by_id(&self, id: ParentId) -> RepoResult<()>;
    /// Removes every row and returns how many were deleted.
    fn delete_all(&self) -> RepoResult<usize>;
    fn exists_by_id(&self, id: ParentId) -> RepoResult<bool>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed parent repository.
pub struct SqliteParentRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteParentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the live schema
    ///   does not cover `PARENT_COLUMNS`.
    /// - `ColumnNullabilityMismatch` when a column's `NOT NULL` flag differs
    ///   from its mapping.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_parent_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ParentRepository for SqliteParentRepository<'_> {
    fn save(&self, parent: &Parent) -> RepoResult<Parent> {
        ensure_unsaved(parent)?;
        parent.validate()?;

        let id = insert_parent(self.conn, parent)?;
        Ok(parent.with_id(id))
    }

    fn save_all(&mut self, parents: &[Parent]) -> RepoResult<Vec<Parent>> {
        for parent in parents {
            ensure_unsaved(parent)?;
            parent.validate()?;
        }
        if parents.is_empty() {
            return Ok(Vec::new());
        }

        let started_at = Instant::now();
        let result = insert_batch(self.conn, parents);
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(saved) => info!(
                "event=parent_save_all module=repo status=ok count={} duration_ms={duration_ms}",
                saved.len()
            ),
            Err(err) => error!(
                "event=parent_save_all module=repo status=error count={} duration_ms={duration_ms} error={err}",
                parents.len()
            ),
        }
        result
    }

    fn find_by_id(&self, id: ParentId) -> RepoResult<Option<Parent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARENT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_parent_row(row)?));
        }

        Ok(None)
    }

    fn find_by_id_in_list(&self, ids: &[ParentId]) -> RepoResult<Vec<Parent>> {
        let unique: Vec<ParentId> = ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut parents = Vec::new();

        // Chunks are ascending and disjoint, so concatenation keeps id order.
        for chunk in unique.chunks(ID_LIST_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare(&format!(
                "{PARENT_SELECT_SQL} WHERE id IN ({placeholders}) ORDER BY id ASC;"
            ))?;
            let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                parents.push(parse_parent_row(row)?);
            }
        }

        Ok(parents)
    }

    fn find_all(&self) -> RepoResult<Vec<Parent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut parents = Vec::new();

        while let Some(row) = rows.next()? {
            parents.push(parse_parent_row(row)?);
        }

        Ok(parents)
    }

    fn update(&self, parent: &Parent) -> RepoResult<Parent> {
        let id = parent.id.ok_or(RepoError::MissingId)?;
        parent.validate()?;

        let changed = self.conn.execute(
            "UPDATE parent
             SET
                first_name = ?1,
                last_name = ?2,
                age = ?3
             WHERE id = ?4;",
            params![
                parent.first_name.as_str(),
                parent.last_name.as_str(),
                parent.age,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(parent.clone())
    }

    fn delete_by_id(&self, id: ParentId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM parent WHERE id = ?1;", [id])?;
        debug!("event=parent_delete module=repo status=ok id={id} removed={changed}");
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM parent;", [])?;
        info!("event=parent_delete_all module=repo status=ok removed={removed}");
        Ok(removed)
    }

    fn exists_by_id(&self, id: ParentId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM parent WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM parent;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn ensure_unsaved(parent: &Parent) -> RepoResult<()> {
    match parent.id {
        Some(id) => Err(RepoError::AlreadyPersisted(id)),
        None => Ok(()),
    }
}

/// Inserts every parent inside one immediate transaction; dropping the
/// transaction on error rolls the whole batch back.
fn insert_batch(conn: &mut Connection, parents: &[Parent]) -> RepoResult<Vec<Parent>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut saved = Vec::with_capacity(parents.len());
    for parent in parents {
        let id = insert_parent(&tx, parent)?;
        saved.push(parent.with_id(id));
    }
    tx.commit()?;
    Ok(saved)
}

fn insert_parent(conn: &Connection, parent: &Parent) -> RepoResult<ParentId> {
    conn.execute(
        "INSERT INTO parent (
            first_name,
            last_name,
            age
        ) VALUES (?1, ?2, ?3);",
        params![
            parent.first_name.as_str(),
            parent.last_name.as_str(),
            parent.age,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

fn parse_parent_row(row: &Row<'_>) -> RepoResult<Parent> {
    let id: ParentId = row.get("id")?;
    let parent = Parent {
        id: Some(id),
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        age: row.get("age")?,
    };

    // The age range guards writes only; rows written out-of-band still load.
    match parent.validate() {
        Ok(()) | Err(ParentValidationError::AgeOutOfRange { .. }) => Ok(parent),
        Err(err) => Err(RepoError::InvalidData(format!(
            "row {id} in {PARENT_TABLE}: {err}"
        ))),
    }
}

fn ensure_parent_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, PARENT_TABLE)? {
        return Err(RepoError::MissingRequiredTable(PARENT_TABLE));
    }

    let columns = table_columns(conn, PARENT_TABLE)?;
    for mapping in PARENT_COLUMNS {
        let Some(&not_null) = columns.get(mapping.column) else {
            return Err(RepoError::MissingRequiredColumn {
                table: PARENT_TABLE,
                column: mapping.column,
            });
        };
        if not_null == mapping.nullable {
            return Err(RepoError::ColumnNullabilityMismatch {
                table: PARENT_TABLE,
                column: mapping.column,
                expected_nullable: mapping.nullable,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Maps each column name to whether it rejects NULL. SQLite reports
/// `notnull = 0` for an `INTEGER PRIMARY KEY`, which is a rowid alias and
/// never NULL, so primary keys count as not-null.
fn table_columns(conn: &Connection, table: &str) -> RepoResult<BTreeMap<String, bool>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let not_null = row.get::<_, i64>(3)? == 1 || row.get::<_, i64>(5)? > 0;
        columns.insert(name, not_null);
    }
    Ok(columns)
}
