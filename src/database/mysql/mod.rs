#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use itertools::Itertools;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;

/// Flattened textual representation of one database row, tagged with its
/// source table. Recomputed fully on every refresh and never diffed against
/// prior state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub table: String,
    pub text: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentInfo {
    pub student_id: i32,
    pub name: String,
    pub age: i32,
    pub department: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceSummary {
    pub student_id: i32,
    pub name: String,
    pub total_classes: i32,
    pub attended_classes: i32,
    pub attendance_percentage: f64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubjectMark {
    pub student_id: i32,
    pub name: String,
    pub subject: String,
    pub marks: i32,
}

/// Connection to the source MySQL database
#[derive(Debug, Clone)]
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    #[inline]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(&config.connection_url())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to MySQL at {}:{}",
                    config.host, config.port
                )
            })?;

        Ok(Self { pool })
    }

    #[inline]
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Cheap reachability check
    #[inline]
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("MySQL ping failed")?;
        Ok(())
    }

    /// List every table in the configured schema
    #[inline]
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SHOW TABLES")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list tables")?;

        rows.iter()
            .map(|row| row.try_get::<String, _>(0).context("Invalid table name"))
            .collect()
    }

    /// Fetch every row of every table as flattened text records.
    ///
    /// Best-effort per table: a table whose dump fails is logged and skipped
    /// so the remaining tables still contribute records.
    #[inline]
    pub async fn fetch_all_records(&self) -> Result<Vec<Record>> {
        let tables = self.list_tables().await?;
        debug!("Found tables: {:?}", tables);

        let mut records = Vec::new();
        for table in &tables {
            match self.fetch_table_records(table).await {
                Ok(mut table_records) => {
                    debug!("Table '{}' has {} rows", table, table_records.len());
                    records.append(&mut table_records);
                }
                Err(e) => {
                    warn!("Skipping table '{}': {e:#}", table);
                }
            }
        }

        info!(
            "Fetched {} records across {} tables",
            records.len(),
            tables.len()
        );
        Ok(records)
    }

    async fn fetch_table_records(&self, table: &str) -> Result<Vec<Record>> {
        let query = select_all_query(table);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to dump table '{}'", table))?;

        Ok(rows
            .iter()
            .map(|row| Record {
                table: table.to_string(),
                text: flatten_row(table, row),
            })
            .collect())
    }

    /// Basic student lookup by id
    #[inline]
    pub async fn student_info(&self, student_id: i32) -> Result<Option<StudentInfo>> {
        sqlx::query_as::<_, StudentInfo>(
            "SELECT student_id, name, age, department \
             FROM students \
             WHERE student_id = ?",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch student info")
    }

    /// Attendance summary joined from the attendance table
    #[inline]
    pub async fn student_attendance(&self, student_id: i32) -> Result<Option<AttendanceSummary>> {
        sqlx::query_as::<_, AttendanceSummary>(
            "SELECT s.student_id, s.name, a.total_classes, a.attended_classes, \
                    a.attendance_percentage \
             FROM students s \
             JOIN student_attendance a ON s.student_id = a.student_id \
             WHERE s.student_id = ?",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch student attendance")
    }

    /// Per-subject marks joined from the marks table
    #[inline]
    pub async fn student_marks(&self, student_id: i32) -> Result<Vec<SubjectMark>> {
        sqlx::query_as::<_, SubjectMark>(
            "SELECT s.student_id, s.name, m.subject, m.marks \
             FROM students s \
             JOIN student_marks m ON s.student_id = m.student_id \
             WHERE s.student_id = ?",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch student marks")
    }
}

/// Unfiltered dump query for one table, with the identifier quoted
fn select_all_query(table: &str) -> String {
    format!("SELECT * FROM `{}`", table.replace('`', "``"))
}

/// Flatten one row into `"Table: <name>, col: val, col: val"` in column order
fn flatten_row(table: &str, row: &MySqlRow) -> String {
    let pairs = row
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{}: {}", column.name(), column_value_text(row, index)))
        .join(", ");

    format!("Table: {}, {}", table, pairs)
}

/// Uniform stringification across the common MySQL column families.
/// NULL values render as `NULL` regardless of column type.
fn column_value_text(row: &MySqlRow, index: usize) -> String {
    macro_rules! try_as {
        ($ty:ty) => {
            if let Ok(value) = row.try_get::<Option<$ty>, _>(index) {
                return match value {
                    Some(v) => v.to_string(),
                    None => "NULL".to_string(),
                };
            }
        };
    }

    try_as!(String);
    try_as!(i64);
    try_as!(u64);
    try_as!(f64);
    try_as!(f32);
    try_as!(bool);
    try_as!(NaiveDate);
    try_as!(NaiveTime);
    try_as!(NaiveDateTime);
    try_as!(DateTime<Utc>);

    // Binary and exotic column types fall through to a lossy byte rendering
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return match value {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => "NULL".to_string(),
        };
    }

    "?".to_string()
}
