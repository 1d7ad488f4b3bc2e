//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide account/contact lookups scoped by account.
//! - Own special date and reminder persistence, including the atomic
//!   remove-then-create replacement of a category.
//!
//! # Invariants
//! - Every contact read is filtered by `account_id`.
//! - `replace_special_date` runs removal, creation and reminder insertion in
//!   one `IMMEDIATE` transaction; any failure leaves the previous record.
//! - Removing a special date removes its reminder through `ON DELETE CASCADE`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::contact::{
    AccountId, Contact, ContactId, ContactValidationError, NewContact,
};
use crate::model::reminder::{FrequencyType, Reminder, ReminderDraft};
use crate::model::special_date::{
    SpecialDate, SpecialDateCategory, SpecialDateDraft, SpecialDateError, SpecialDateId,
};
use crate::support::date::{format_date, parse_date};
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    account_id,
    uuid,
    first_name,
    last_name
FROM contacts";

const SPECIAL_DATE_SELECT_SQL: &str = "SELECT
    sd.id,
    sd.account_id,
    sd.contact_id,
    sd.category,
    sd.is_age_based,
    sd.is_year_unknown,
    sd.year,
    sd.month,
    sd.day,
    r.id AS reminder_id,
    r.frequency_type,
    r.frequency_number,
    r.title,
    r.initial_date,
    r.next_expected_date
FROM special_dates sd
LEFT JOIN reminders r ON r.special_date_id = sd.id";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("accounts", &["id"]),
    (
        "contacts",
        &["id", "account_id", "uuid", "first_name", "last_name"],
    ),
    (
        "special_dates",
        &[
            "id",
            "account_id",
            "contact_id",
            "category",
            "is_age_based",
            "is_year_unknown",
            "year",
            "month",
            "day",
        ],
    ),
    (
        "reminders",
        &[
            "id",
            "account_id",
            "contact_id",
            "special_date_id",
            "frequency_type",
            "frequency_number",
            "title",
            "initial_date",
            "next_expected_date",
        ],
    ),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Contact input rejected before persistence.
    Validation(ContactValidationError),
    /// Special date draft rejected before persistence.
    InvalidSpecialDate(SpecialDateError),
    AccountNotFound(AccountId),
    ContactNotFound {
        account_id: AccountId,
        contact_id: ContactId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidSpecialDate(err) => write!(f, "{err}"),
            Self::AccountNotFound(id) => write!(f, "account not found: {id}"),
            Self::ContactNotFound {
                account_id,
                contact_id,
            } => write!(f, "contact not found: {contact_id} in account {account_id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "contact repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "contact repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "contact repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidSpecialDate(err) => Some(err),
            _ => None,
        }
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

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SpecialDateError> for RepoError {
    fn from(value: SpecialDateError) -> Self {
        Self::InvalidSpecialDate(value)
    }
}

/// Repository interface for contacts and their special dates.
pub trait ContactRepository {
    /// Creates an empty account and returns its id.
    fn create_account(&self) -> RepoResult<AccountId>;
    fn account_exists(&self, account_id: AccountId) -> RepoResult<bool>;
    /// Creates a contact under an existing account.
    fn create_contact(&self, account_id: AccountId, contact: &NewContact) -> RepoResult<Contact>;
    /// Looks a contact up by id, only within the given account.
    fn find_contact(
        &self,
        account_id: AccountId,
        contact_id: ContactId,
    ) -> RepoResult<Option<Contact>>;
    /// Gets the contact's special date of one category, with its reminder.
    fn get_special_date(
        &self,
        contact: &Contact,
        category: SpecialDateCategory,
    ) -> RepoResult<Option<SpecialDate>>;
    fn get_reminder(&self, special_date_id: SpecialDateId) -> RepoResult<Option<Reminder>>;
    /// Removes the contact's special date of one category, if any.
    ///
    /// Returns whether a record was removed.
    fn remove_special_date(
        &mut self,
        contact: &Contact,
        category: SpecialDateCategory,
    ) -> RepoResult<bool>;
    /// Atomically replaces the contact's special date of one category and
    /// optionally attaches a reminder to the new record.
    fn replace_special_date(
        &mut self,
        contact: &Contact,
        category: SpecialDateCategory,
        date: &SpecialDateDraft,
        reminder: Option<&ReminderDraft>,
    ) -> RepoResult<SpecialDate>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_contact_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn create_account(&self) -> RepoResult<AccountId> {
        self.conn.execute("INSERT INTO accounts DEFAULT VALUES;", [])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn account_exists(&self, account_id: AccountId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1);",
            [account_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_contact(&self, account_id: AccountId, contact: &NewContact) -> RepoResult<Contact> {
        let normalized = contact.normalized()?;
        if !self.account_exists(account_id)? {
            return Err(RepoError::AccountNotFound(account_id));
        }

        let uuid = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO contacts (account_id, uuid, first_name, last_name)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                account_id,
                uuid.to_string(),
                normalized.first_name.as_str(),
                normalized.last_name.as_deref(),
            ],
        )?;

        Ok(Contact {
            id: self.conn.last_insert_rowid(),
            account_id,
            uuid,
            first_name: normalized.first_name,
            last_name: normalized.last_name,
        })
    }

    fn find_contact(
        &self,
        account_id: AccountId,
        contact_id: ContactId,
    ) -> RepoResult<Option<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTACT_SELECT_SQL}
             WHERE id = ?1
               AND account_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![contact_id, account_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }

        Ok(None)
    }

    fn get_special_date(
        &self,
        contact: &Contact,
        category: SpecialDateCategory,
    ) -> RepoResult<Option<SpecialDate>> {
        load_special_date(self.conn, contact, category)
    }

    fn get_reminder(&self, special_date_id: SpecialDateId) -> RepoResult<Option<Reminder>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                account_id,
                contact_id,
                special_date_id,
                frequency_type,
                frequency_number,
                title,
                initial_date,
                next_expected_date
             FROM reminders
             WHERE special_date_id = ?1;",
        )?;

        let mut rows = stmt.query([special_date_id])?;
        if let Some(row) = rows.next()? {
            let reminder = Reminder {
                id: row.get("id")?,
                account_id: row.get("account_id")?,
                contact_id: row.get("contact_id")?,
                special_date_id: row.get("special_date_id")?,
                frequency_type: parse_frequency_type(row.get("frequency_type")?)?,
                frequency_number: row.get("frequency_number")?,
                title: row.get("title")?,
                initial_date: parse_stored_date(row.get("initial_date")?, "initial_date")?,
                next_expected_date: parse_stored_date(
                    row.get("next_expected_date")?,
                    "next_expected_date",
                )?,
            };
            return Ok(Some(reminder));
        }

        Ok(None)
    }

    fn remove_special_date(
        &mut self,
        contact: &Contact,
        category: SpecialDateCategory,
    ) -> RepoResult<bool> {
        let removed = delete_special_date(self.conn, contact, category)?;
        debug!(
            "event=special_date_remove module=repo status=ok category={} removed={}",
            category, removed
        );
        Ok(removed)
    }

    fn replace_special_date(
        &mut self,
        contact: &Contact,
        category: SpecialDateCategory,
        date: &SpecialDateDraft,
        reminder: Option<&ReminderDraft>,
    ) -> RepoResult<SpecialDate> {
        date.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !contact_exists_in(&tx, contact)? {
            return Err(RepoError::ContactNotFound {
                account_id: contact.account_id,
                contact_id: contact.id,
            });
        }

        let removed = delete_special_date(&tx, contact, category)?;

        tx.execute(
            "INSERT INTO special_dates (
                account_id,
                contact_id,
                category,
                is_age_based,
                is_year_unknown,
                year,
                month,
                day
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                contact.account_id,
                contact.id,
                category.as_str(),
                bool_to_int(date.is_age_based),
                bool_to_int(date.is_year_unknown),
                date.year,
                date.month,
                date.day,
            ],
        )?;
        let special_date_id = tx.last_insert_rowid();

        if let Some(reminder) = reminder {
            tx.execute(
                "INSERT INTO reminders (
                    account_id,
                    contact_id,
                    special_date_id,
                    frequency_type,
                    frequency_number,
                    title,
                    initial_date,
                    next_expected_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    contact.account_id,
                    contact.id,
                    special_date_id,
                    reminder.frequency_type.as_str(),
                    reminder.frequency_number,
                    reminder.title.as_str(),
                    format_date(reminder.initial_date),
                    format_date(reminder.next_expected_date),
                ],
            )?;
        }

        tx.execute(
            "UPDATE contacts
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [contact.id],
        )?;

        let created = load_special_date(&tx, contact, category)?.ok_or_else(|| {
            RepoError::InvalidData("special date missing after insert".to_string())
        })?;
        tx.commit()?;

        info!(
            "event=special_date_replace module=repo status=ok category={} removed={} reminder={}",
            category,
            removed,
            created.reminder.is_some()
        );
        Ok(created)
    }
}

fn delete_special_date(
    conn: &Connection,
    contact: &Contact,
    category: SpecialDateCategory,
) -> RepoResult<bool> {
    let changed = conn.execute(
        "DELETE FROM special_dates
         WHERE contact_id = ?1
           AND account_id = ?2
           AND category = ?3;",
        params![contact.id, contact.account_id, category.as_str()],
    )?;
    Ok(changed > 0)
}

fn contact_exists_in(conn: &Connection, contact: &Contact) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM contacts
            WHERE id = ?1
              AND account_id = ?2
        );",
        params![contact.id, contact.account_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_special_date(
    conn: &Connection,
    contact: &Contact,
    category: SpecialDateCategory,
) -> RepoResult<Option<SpecialDate>> {
    let mut stmt = conn.prepare(&format!(
        "{SPECIAL_DATE_SELECT_SQL}
         WHERE sd.contact_id = ?1
           AND sd.account_id = ?2
           AND sd.category = ?3;"
    ))?;

    let row = stmt
        .query_row(
            params![contact.id, contact.account_id, category.as_str()],
            |row| Ok(parse_special_date_row(row)),
        )
        .optional()?;

    row.transpose()
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in contacts.uuid"))
    })?;

    Ok(Contact {
        id: row.get("id")?,
        account_id: row.get("account_id")?,
        uuid,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
    })
}

fn parse_special_date_row(row: &Row<'_>) -> RepoResult<SpecialDate> {
    let category_text: String = row.get("category")?;
    let category = SpecialDateCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in special_dates.category"
        ))
    })?;

    let draft = SpecialDateDraft {
        is_age_based: parse_flag(row.get("is_age_based")?, "special_dates.is_age_based")?,
        is_year_unknown: parse_flag(row.get("is_year_unknown")?, "special_dates.is_year_unknown")?,
        year: row.get("year")?,
        month: row.get("month")?,
        day: row.get("day")?,
    };
    draft
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("special_dates row: {err}")))?;

    let id: SpecialDateId = row.get("id")?;
    let account_id: AccountId = row.get("account_id")?;
    let contact_id: ContactId = row.get("contact_id")?;

    let reminder = match row.get::<_, Option<i64>>("reminder_id")? {
        Some(reminder_id) => Some(Reminder {
            id: reminder_id,
            account_id,
            contact_id,
            special_date_id: id,
            frequency_type: parse_frequency_type(row.get("frequency_type")?)?,
            frequency_number: row.get("frequency_number")?,
            title: row.get("title")?,
            initial_date: parse_stored_date(row.get("initial_date")?, "initial_date")?,
            next_expected_date: parse_stored_date(
                row.get("next_expected_date")?,
                "next_expected_date",
            )?,
        }),
        None => None,
    };

    Ok(SpecialDate {
        id,
        account_id,
        contact_id,
        category,
        is_age_based: draft.is_age_based,
        is_year_unknown: draft.is_year_unknown,
        year: draft.year,
        month: draft.month,
        day: draft.day,
        reminder,
    })
}

fn parse_frequency_type(value: String) -> RepoResult<FrequencyType> {
    FrequencyType::parse(&value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid frequency type `{value}` in reminders.frequency_type"
        ))
    })
}

fn parse_stored_date(value: String, column: &'static str) -> RepoResult<NaiveDate> {
    parse_date(&value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid date `{value}` in reminders.{column}")))
}

fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_contact_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
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

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
