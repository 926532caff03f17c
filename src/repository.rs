use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Row};

use crate::db::Db;
use crate::error::{Error, Result};
use crate::filters::{calculate_metadata, Filters, Metadata};
use crate::models::{Course, NewCourse};
use crate::validation::validate_filters;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

const COURSE_COLUMNS: &str = "id, created_at, last_updated_at, version, name, description, \
                              location::text AS location, tags, website";

/// Storage operations for courses. Every call is bounded by `timeout`.
#[derive(Clone)]
pub struct CourseRepository {
    db: Db,
    timeout: Duration,
}

impl CourseRepository {
    pub fn new(db: Db, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn insert(&self, course: &NewCourse) -> Result<Course> {
        let sql = format!(
            r#"
            INSERT INTO courses (name, description, location, tags, website)
            VALUES ($1, $2, $3::point, $4, $5)
            RETURNING {COURSE_COLUMNS}
            "#
        );

        let query = sqlx::query_as::<_, Course>(&sql)
            .bind(&course.name)
            .bind(&course.description)
            .bind(course.location)
            .bind(&course.tags)
            .bind(&course.website);
        let course = with_timeout(self.timeout, query.fetch_one(&self.db)).await?;

        tracing::debug!(id = course.id, "course inserted");
        Ok(course)
    }

    pub async fn get(&self, id: i64) -> Result<Course> {
        if id < 1 {
            return Err(Error::NotFound);
        }

        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");

        let query = sqlx::query_as::<_, Course>(&sql).bind(id);
        with_timeout(self.timeout, query.fetch_optional(&self.db))
            .await?
            .ok_or(Error::NotFound)
    }

    /// Write the whole course back, provided nobody else has since.
    ///
    /// The row must still carry `course.version`; on success the bumped
    /// version and `last_updated_at` are written into `course`. A missing
    /// row and a stale version are indistinguishable here and both yield
    /// `EditConflict`.
    pub async fn update(&self, course: &mut Course) -> Result<()> {
        let query = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r#"
            UPDATE courses
            SET name = $1, description = $2, location = $3::point, tags = $4, website = $5,
                last_updated_at = now(), version = version + 1
            WHERE id = $6 AND version = $7
            RETURNING version, last_updated_at
            "#,
        )
        .bind(&course.name)
        .bind(&course.description)
        .bind(course.location)
        .bind(&course.tags)
        .bind(&course.website)
        .bind(course.id)
        .bind(course.version);
        let row = with_timeout(self.timeout, query.fetch_optional(&self.db)).await?;

        let Some((version, last_updated_at)) = row else {
            tracing::debug!(id = course.id, version = course.version, "edit conflict");
            return Err(Error::EditConflict);
        };

        course.version = version;
        course.last_updated_at = last_updated_at;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if id < 1 {
            return Err(Error::NotFound);
        }

        let query = sqlx::query("DELETE FROM courses WHERE id = $1").bind(id);
        let result = with_timeout(self.timeout, query.execute(&self.db)).await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    /// One page of courses matching `name` (full text) and containing every
    /// tag in `tags`, with the total match count from the same statement.
    ///
    /// The count is joined onto the page rather than windowed over it, so a
    /// page past the end still reports the real total.
    pub async fn list(
        &self,
        name: &str,
        tags: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Course>, Metadata)> {
        validate_filters(filters)?;
        let (column, direction) = filters.order_by()?;
        let (column, direction) = (column.as_sql(), direction.as_sql());

        let sql = format!(
            r#"
            WITH matched AS (
                SELECT {COURSE_COLUMNS}
                FROM courses
                WHERE (to_tsvector('simple', name) @@ plainto_tsquery('simple', $1) OR $1 = '')
                AND (tags @> $2 OR $2 = '{{}}')
            ),
            page AS (
                SELECT * FROM matched
                ORDER BY {column} {direction}, id ASC
                LIMIT $3 OFFSET $4
            )
            SELECT total.total_records, page.*
            FROM (SELECT count(*) AS total_records FROM matched) AS total
            LEFT JOIN page ON true
            ORDER BY page.{column} {direction}, page.id ASC
            "#
        );

        let query = sqlx::query(&sql)
            .bind(name)
            .bind(tags)
            .bind(filters.limit())
            .bind(filters.offset());
        let rows = with_timeout(self.timeout, query.fetch_all(&self.db)).await?;

        let mut total_records = 0;
        let mut courses = Vec::with_capacity(rows.len());
        for row in &rows {
            total_records = row.try_get::<i64, _>("total_records")?;
            // An empty page still yields the count row, with NULL course columns.
            if row.try_get::<Option<i64>, _>("id")?.is_some() {
                courses.push(Course::from_row(row)?);
            }
        }

        let metadata = calculate_metadata(total_records, filters.page, filters.page_size);
        Ok((courses, metadata))
    }
}

/// Run `fut`, turning deadline expiry into `Error::Timeout`.
pub async fn with_timeout<T, E, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    Error: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(Error::from),
        Err(_) => Err(Error::Timeout),
    }
}
