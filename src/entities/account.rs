// 💳 Account Entity - the one resource this service manages
//
// Identity: integer id assigned by the database on insert, never changes
// Values: name, email, address, phone_number, date_joined (all replaceable)

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::{AccountError, Result, ValidationError};

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Database identity. `None` until [`Account::create`] runs.
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone_number: String,
    pub date_joined: NaiveDate,
}

impl Default for Account {
    fn default() -> Self {
        Account {
            id: None,
            name: String::new(),
            email: String::new(),
            address: String::new(),
            phone_number: String::new(),
            date_joined: today(),
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl Account {
    /// Transient account (no id yet) joined today
    pub fn new(name: &str, email: &str, address: &str, phone_number: &str) -> Self {
        Account {
            id: None,
            name: name.to_string(),
            email: email.to_string(),
            address: address.to_string(),
            phone_number: phone_number.to_string(),
            date_joined: today(),
        }
    }

    // ========================================================================
    // WIRE REPRESENTATION
    // ========================================================================

    pub fn serialize(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "address": self.address,
            "phone_number": self.phone_number,
            "date_joined": self.date_joined.format("%Y-%m-%d").to_string(),
        })
    }

    /// Replace every mutable field from a JSON object.
    ///
    /// Fields are all parsed first, so a rejected payload leaves `self`
    /// untouched. `id` and any unknown keys are ignored. A missing or `null`
    /// `date_joined` means "today".
    pub fn deserialize(&mut self, data: &Value) -> Result<(), ValidationError> {
        let object = data.as_object().ok_or(ValidationError::TypeMismatch {
            field: "body",
            expected: "a JSON object",
        })?;

        let name = required_str(object, "name")?;
        let email = required_str(object, "email")?;
        let address = required_str(object, "address")?;
        let phone_number = required_str(object, "phone_number")?;
        let date_joined = optional_date(object, "date_joined")?.unwrap_or_else(today);

        self.name = name;
        self.email = email;
        self.address = address;
        self.phone_number = phone_number;
        self.date_joined = date_joined;

        Ok(())
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Insert a new row and take the id the database assigns.
    pub fn create(&mut self, conn: &Connection) -> Result<()> {
        info!(name = %self.name, "creating account");
        conn.execute(
            "INSERT INTO accounts (name, email, address, phone_number, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.name,
                self.email,
                self.address,
                self.phone_number,
                self.date_joined,
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    pub fn update(&self, conn: &Connection) -> Result<()> {
        let id = self.id.ok_or(AccountError::MissingId)?;
        info!(id, name = %self.name, "saving account");
        conn.execute(
            "UPDATE accounts
             SET name = ?1, email = ?2, address = ?3, phone_number = ?4, date_joined = ?5
             WHERE id = ?6",
            params![
                self.name,
                self.email,
                self.address,
                self.phone_number,
                self.date_joined,
                id,
            ],
        )?;
        Ok(())
    }

    /// Remove the row. Deleting a row that is already gone is not an error.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        let id = self.id.ok_or(AccountError::MissingId)?;
        info!(id, "deleting account");
        let removed = conn.execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        if removed == 0 {
            debug!(id, "account was already absent");
        }
        Ok(())
    }

    pub fn find(conn: &Connection, id: i64) -> Result<Option<Account>> {
        debug!(id, "looking up account");
        let account = conn
            .query_row(
                "SELECT id, name, email, address, phone_number, date_joined
                 FROM accounts WHERE id = ?1",
                params![id],
                Account::from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Every stored account, ordered by id.
    pub fn all(conn: &Connection) -> Result<Vec<Account>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, email, address, phone_number, date_joined
             FROM accounts ORDER BY id",
        )?;

        let accounts = stmt
            .query_map([], Account::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(accounts)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
        Ok(Account {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            email: row.get(2)?,
            address: row.get(3)?,
            phone_number: row.get(4)?,
            date_joined: row.get(5)?,
        })
    }
}

fn required_str(object: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingKey(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::TypeMismatch {
            field,
            expected: "a string",
        }),
    }
}

fn optional_date(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<NaiveDate>, ValidationError> {
    let mismatch = ValidationError::TypeMismatch {
        field,
        expected: "an ISO date (YYYY-MM-DD)",
    };
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| mismatch),
        Some(_) => Err(mismatch),
    }
}

// ============================================================================
// TESTS
// ============================================================================
