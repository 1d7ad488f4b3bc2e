use chrono::NaiveDate;
use contactbook_core::db::migrations::latest_version;
use contactbook_core::db::open_db_in_memory;
use contactbook_core::{
    Contact, ContactRepository, ContactValidationError, FrequencyType, NewContact, RepoError,
    ReminderDraft, SpecialDateCategory, SpecialDateDraft, SqliteContactRepository, YEAR_UNKNOWN,
};
use rusqlite::Connection;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn seed_contact(repo: &SqliteContactRepository<'_>, first_name: &str) -> Contact {
    let account_id = repo.create_account().unwrap();
    repo.create_contact(account_id, &NewContact::new(first_name, None))
        .unwrap()
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_and_find_contact_is_scoped_by_account() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&mut conn).unwrap();

    let account_a = repo.create_account().unwrap();
    let account_b = repo.create_account().unwrap();
    let contact = repo
        .create_contact(
            account_a,
            &NewContact::new(" Grace ", Some("Hopper".to_string())),
        )
        .unwrap();
    assert_eq!(contact.first_name, "Grace");
    assert_eq!(contact.last_name.as_deref(), Some("Hopper"));

    let found = repo.find_contact(account_a, contact.id).unwrap().unwrap();
    assert_eq!(found, contact);
    assert!(repo.find_contact(account_b, contact.id).unwrap().is_none());
}

#[test]
fn create_contact_rejects_unknown_account_and_blank_name() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteContactRepository::try_new(&mut conn).unwrap();

    let err = repo
        .create_contact(42, &NewContact::new("Ada", None))
        .unwrap_err();
    assert!(matches!(err, RepoError::AccountNotFound(42)));

    let account_id = repo.create_account().unwrap();
    let err = repo
        .create_contact(account_id, &NewContact::new("  ", None))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ContactValidationError::BlankFirstName)
    ));
}

#[test]
fn replace_special_date_persists_reminder_and_reads_back() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteContactRepository::try_new(&mut conn).unwrap();
    let contact = seed_contact(&repo, "Ada");

    let date = SpecialDateDraft::from_date(1852, 11, 27).unwrap();
    let reminder = ReminderDraft::yearly("anniversary", &date, ymd(2024, 1, 1)).unwrap();
    let created = repo
        .replace_special_date(
            &contact,
            SpecialDateCategory::DeceasedDate,
            &date,
            Some(&reminder),
        )
        .unwrap();

    assert_eq!(created.category, SpecialDateCategory::DeceasedDate);
    assert_eq!((created.year, created.month, created.day), (1852, 11, 27));
    assert_eq!(created.date(), Some(ymd(1852, 11, 27)));
    let attached = created.reminder.clone().unwrap();
    assert_eq!(attached.frequency_type, FrequencyType::Year);
    assert_eq!(attached.frequency_number, 1);
    assert_eq!(attached.special_date_id, created.id);
    assert_eq!(attached.next_expected_date, ymd(2024, 11, 27));

    let loaded = repo
        .get_special_date(&contact, SpecialDateCategory::DeceasedDate)
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
    assert_eq!(repo.get_reminder(created.id).unwrap(), Some(attached));
}

#[test]
fn replace_special_date_keeps_one_record_per_category() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteContactRepository::try_new(&mut conn).unwrap();
        let contact = seed_contact(&repo, "Ada");

        let birth = SpecialDateDraft::from_date(1815, 12, 10).unwrap();
        repo.replace_special_date(&contact, SpecialDateCategory::Birthdate, &birth, None)
            .unwrap();

        let first = SpecialDateDraft::from_date(1852, 11, 27).unwrap();
        let reminder = ReminderDraft::yearly("t", &first, ymd(2024, 1, 1)).unwrap();
        repo.replace_special_date(
            &contact,
            SpecialDateCategory::DeceasedDate,
            &first,
            Some(&reminder),
        )
        .unwrap();

        let second = SpecialDateDraft::from_date(YEAR_UNKNOWN, 11, 27).unwrap();
        let replaced = repo
            .replace_special_date(&contact, SpecialDateCategory::DeceasedDate, &second, None)
            .unwrap();
        assert!(replaced.is_year_unknown);
        assert_eq!(replaced.date(), None);

        let birthdate = repo
            .get_special_date(&contact, SpecialDateCategory::Birthdate)
            .unwrap();
        assert!(birthdate.is_some());
    }

    assert_eq!(count_rows(&conn, "special_dates"), 2);
    assert_eq!(count_rows(&conn, "reminders"), 0);
}

#[test]
fn remove_special_date_is_idempotent_and_drops_reminder() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteContactRepository::try_new(&mut conn).unwrap();
        let contact = seed_contact(&repo, "Ada");
        let date = SpecialDateDraft::from_date(1852, 11, 27).unwrap();
        let reminder = ReminderDraft::yearly("t", &date, ymd(2024, 1, 1)).unwrap();
        repo.replace_special_date(
            &contact,
            SpecialDateCategory::DeceasedDate,
            &date,
            Some(&reminder),
        )
        .unwrap();

        assert!(repo
            .remove_special_date(&contact, SpecialDateCategory::DeceasedDate)
            .unwrap());
        assert!(!repo
            .remove_special_date(&contact, SpecialDateCategory::DeceasedDate)
            .unwrap());
    }

    assert_eq!(count_rows(&conn, "special_dates"), 0);
    assert_eq!(count_rows(&conn, "reminders"), 0);
}

#[test]
fn failed_reminder_insert_rolls_back_the_whole_replacement() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteContactRepository::try_new(&mut conn).unwrap();
    let contact = seed_contact(&repo, "Ada");

    let original = SpecialDateDraft::from_date(1852, 11, 27).unwrap();
    let created = repo
        .replace_special_date(&contact, SpecialDateCategory::DeceasedDate, &original, None)
        .unwrap();

    let next = SpecialDateDraft::from_date(1853, 1, 1).unwrap();
    let mut broken = ReminderDraft::yearly("t", &next, ymd(2024, 1, 1)).unwrap();
    broken.frequency_number = 0;
    let err = repo
        .replace_special_date(
            &contact,
            SpecialDateCategory::DeceasedDate,
            &next,
            Some(&broken),
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    let current = repo
        .get_special_date(&contact, SpecialDateCategory::DeceasedDate)
        .unwrap()
        .unwrap();
    assert_eq!(current, created);
}

#[test]
fn replace_special_date_rejects_invalid_draft_and_missing_contact() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteContactRepository::try_new(&mut conn).unwrap();
    let contact = seed_contact(&repo, "Ada");

    let mut invalid = SpecialDateDraft::from_date(2020, 1, 31).unwrap();
    invalid.month = 2;
    let err = repo
        .replace_special_date(&contact, SpecialDateCategory::DeceasedDate, &invalid, None)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidSpecialDate(_)));

    let mut stranger = contact.clone();
    stranger.account_id += 100;
    let valid = SpecialDateDraft::from_date(2020, 1, 31).unwrap();
    let err = repo
        .replace_special_date(&stranger, SpecialDateCategory::DeceasedDate, &valid, None)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::ContactNotFound { contact_id, .. } if contact_id == contact.id
    ));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    match SqliteContactRepository::try_new(&mut conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY);
         CREATE TABLE contacts (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            uuid TEXT NOT NULL,
            first_name TEXT NOT NULL
         );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteContactRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "contacts",
            column: "last_name"
        })
    ));
}
