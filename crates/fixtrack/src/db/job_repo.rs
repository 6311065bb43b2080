//! Job repository — tenant-scoped CRUD for the `jobs` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub business_id: String,
    pub seq: i64,
    pub code: String,
    pub customer_id: String,
    pub assigned_to: Option<String>,
    pub equipment: String,
    pub description: Option<String>,
    pub status: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            business_id: row.get("business_id")?,
            seq: row.get("seq")?,
            code: row.get("code")?,
            customer_id: row.get("customer_id")?,
            assigned_to: row.get("assigned_to")?,
            equipment: row.get("equipment")?,
            description: row.get("description")?,
            status: row.get("status")?,
            version: row.get("version")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub customer_id: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| insert_with(conn, job))
}

/// Inserts a new job row on an already-locked connection.
pub fn insert_with(conn: &rusqlite::Connection, job: &JobRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO jobs (id, business_id, seq, code, customer_id, assigned_to,
         equipment, description, status, version, created_at, updated_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            job.id,
            job.business_id,
            job.seq,
            job.code,
            job.customer_id,
            job.assigned_to,
            job.equipment,
            job.description,
            job.status,
            job.version,
            job.created_at,
            job.updated_at,
            job.completed_at,
        ],
    )?;
    Ok(())
}

/// Updates a job row if its stored version still matches `expected_version`.
/// Returns false when the row was not found or another writer got there
/// first (the version moved on).
pub fn update_checked(
    conn: &rusqlite::Connection,
    job: &JobRow,
    expected_version: i64,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE jobs SET customer_id=?3, assigned_to=?4, equipment=?5, description=?6,
         status=?7, version=?8, updated_at=?9, completed_at=?10
         WHERE id=?1 AND business_id=?2 AND version=?11",
        params![
            job.id,
            job.business_id,
            job.customer_id,
            job.assigned_to,
            job.equipment,
            job.description,
            job.status,
            job.version,
            job.updated_at,
            job.completed_at,
            expected_version,
        ],
    )?;
    Ok(changed == 1)
}

/// Finds a job by id within a tenant.
pub fn find_by_id(
    db: &Database,
    id: &str,
    business_id: &str,
) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| find_by_id_with(conn, id, business_id))
}

/// Finds a job by id within a tenant on an already-locked connection.
pub fn find_by_id_with(
    conn: &rusqlite::Connection,
    id: &str,
    business_id: &str,
) -> Result<Option<JobRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1 AND business_id = ?2")?;
    let mut rows = stmt.query_map(params![id, business_id], JobRow::from_row)?;
    match rows.next() {
        Some(Ok(row)) => Ok(Some(row)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Deletes a job. Returns false if no row matched.
pub fn delete(db: &Database, id: &str, business_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "DELETE FROM jobs WHERE id = ?1 AND business_id = ?2",
            params![id, business_id],
        )?;
        Ok(changed == 1)
    })
}

/// Allocates the next per-tenant job sequence number.
pub fn next_seq(conn: &rusqlite::Connection, business_id: &str) -> Result<i64, DatabaseError> {
    let next: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM jobs WHERE business_id = ?1",
        params![business_id],
        |r| r.get(0),
    )?;
    Ok(next)
}

/// Queries jobs with filters, returning (rows, total_count).
pub fn query(
    db: &Database,
    business_id: &str,
    filter: &JobFilter,
) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = vec!["business_id = ?1".to_string()];
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(business_id.to_string())];

        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }
        if let Some(ref assigned_to) = filter.assigned_to {
            conditions.push(format!("assigned_to = ?{}", param_values.len() + 1));
            param_values.push(Box::new(assigned_to.clone()));
        }
        if let Some(ref customer_id) = filter.customer_id {
            conditions.push(format!("customer_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(customer_id.clone()));
        }
        if let Some(ref from_date) = filter.from_date {
            conditions.push(format!("created_at >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(from_date.clone()));
        }
        if let Some(ref to_date) = filter.to_date {
            conditions.push(format!("created_at <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(to_date.clone()));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        // Count total matching rows.
        let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        // Fetch paginated results.
        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Lists every job of a tenant (analytics input).
pub fn list_all(db: &Database, business_id: &str) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM jobs WHERE business_id = ?1 ORDER BY created_at")?;
        let rows: Vec<JobRow> = stmt
            .query_map(params![business_id], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts a tenant's jobs with the given status.
pub fn count_by_status(
    db: &Database,
    business_id: &str,
    status: &str,
) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE business_id = ?1 AND status = ?2",
            params![business_id, status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_job(id: &str, business_id: &str, seq: i64) -> JobRow {
        JobRow {
            id: id.to_string(),
            business_id: business_id.to_string(),
            seq,
            code: format!("JOB-{:04}", seq),
            customer_id: "cust-1".to_string(),
            assigned_to: None,
            equipment: "MacBook Pro 14\"".to_string(),
            description: Some("No power".to_string()),
            status: "waiting_assessment".to_string(),
            version: 1,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: None,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        insert(&db, &sample_job("job-1", "biz-1", 1)).unwrap();

        let found = find_by_id(&db, "job-1", "biz-1").unwrap();
        assert!(found.is_some());
        let found = found.unwrap();
        assert_eq!(found.code, "JOB-0001");
        assert_eq!(found.status, "waiting_assessment");
        assert_eq!(found.version, 1);
    }

    #[test]
    fn test_find_wrong_tenant() {
        let db = test_db();
        insert(&db, &sample_job("job-1", "biz-1", 1)).unwrap();

        let found = find_by_id(&db, "job-1", "biz-2").unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_update_checked_bumps_version() {
        let db = test_db();
        let mut job = sample_job("job-2", "biz-1", 1);
        insert(&db, &job).unwrap();

        job.status = "in_progress".to_string();
        job.assigned_to = Some("user-1".to_string());
        job.version = 2;
        job.updated_at = "2026-01-02T00:00:00Z".to_string();
        let ok = db.with_conn(|conn| update_checked(conn, &job, 1)).unwrap();
        assert!(ok);

        let found = find_by_id(&db, "job-2", "biz-1").unwrap().unwrap();
        assert_eq!(found.status, "in_progress");
        assert_eq!(found.version, 2);
    }

    #[test]
    fn test_update_checked_stale_version() {
        let db = test_db();
        let mut job = sample_job("job-3", "biz-1", 1);
        insert(&db, &job).unwrap();

        job.version = 2;
        let ok = db.with_conn(|conn| update_checked(conn, &job, 7)).unwrap();
        assert!(!ok);

        let found = find_by_id(&db, "job-3", "biz-1").unwrap().unwrap();
        assert_eq!(found.version, 1);
    }

    #[test]
    fn test_next_seq_per_tenant() {
        let db = test_db();
        insert(&db, &sample_job("a", "biz-1", 1)).unwrap();
        insert(&db, &sample_job("b", "biz-1", 2)).unwrap();
        insert(&db, &sample_job("c", "biz-2", 1)).unwrap();

        db.with_conn(|conn| {
            assert_eq!(next_seq(conn, "biz-1").unwrap(), 3);
            assert_eq!(next_seq(conn, "biz-2").unwrap(), 2);
            assert_eq!(next_seq(conn, "biz-3").unwrap(), 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_query_with_status_filter() {
        let db = test_db();
        insert(&db, &sample_job("s1", "biz-1", 1)).unwrap();

        let mut completed = sample_job("s2", "biz-1", 2);
        completed.status = "completed".to_string();
        insert(&db, &completed).unwrap();

        let (rows, total) = query(
            &db,
            "biz-1",
            &JobFilter {
                status: Some("completed".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "s2");
    }

    #[test]
    fn test_query_scoped_to_tenant() {
        let db = test_db();
        insert(&db, &sample_job("t1", "biz-1", 1)).unwrap();
        insert(&db, &sample_job("t2", "biz-2", 1)).unwrap();

        let (rows, total) = query(&db, "biz-1", &JobFilter::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, "t1");
    }

    #[test]
    fn test_query_pagination() {
        let db = test_db();
        for i in 0..10 {
            let mut job = sample_job(&format!("p{}", i), "biz-1", i + 1);
            job.created_at = format!("2026-01-{:02}T00:00:00Z", i + 1);
            insert(&db, &job).unwrap();
        }

        let (rows, total) = query(
            &db,
            "biz-1",
            &JobFilter {
                limit: Some(3),
                offset: Some(0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 10);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        insert(&db, &sample_job("d1", "biz-1", 1)).unwrap();

        assert!(delete(&db, "d1", "biz-1").unwrap());
        assert!(!delete(&db, "d1", "biz-1").unwrap());
        assert!(find_by_id(&db, "d1", "biz-1").unwrap().is_none());
    }

    #[test]
    fn test_count_by_status() {
        let db = test_db();
        insert(&db, &sample_job("c1", "biz-1", 1)).unwrap();
        insert(&db, &sample_job("c2", "biz-1", 2)).unwrap();

        let mut done = sample_job("c3", "biz-1", 3);
        done.status = "completed".to_string();
        insert(&db, &done).unwrap();

        assert_eq!(count_by_status(&db, "biz-1", "waiting_assessment").unwrap(), 2);
        assert_eq!(count_by_status(&db, "biz-1", "completed").unwrap(), 1);
        assert_eq!(count_by_status(&db, "biz-1", "on_hold").unwrap(), 0);
    }
}
