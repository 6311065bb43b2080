//! Customer repository.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw customer row.
#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

impl CustomerRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            business_id: row.get("business_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a new customer row.
pub fn insert(db: &Database, customer: &CustomerRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO customers (id, business_id, name, email, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                customer.id,
                customer.business_id,
                customer.name,
                customer.email,
                customer.phone,
                customer.created_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a customer by id within a tenant.
pub fn find_by_id(
    db: &Database,
    id: &str,
    business_id: &str,
) -> Result<Option<CustomerRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM customers WHERE id = ?1 AND business_id = ?2")?;
        let mut rows = stmt.query_map(params![id, business_id], CustomerRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists every customer of a tenant.
pub fn list_all(db: &Database, business_id: &str) -> Result<Vec<CustomerRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM customers WHERE business_id = ?1 ORDER BY name")?;
        let rows: Vec<CustomerRow> = stmt
            .query_map(params![business_id], CustomerRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
