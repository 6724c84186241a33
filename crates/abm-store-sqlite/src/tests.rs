//! Integration tests for the SQLite store against in-memory and on-disk
//! databases.

use abm_core::{
  audit::Auditable as _,
  contact::{Contact, ContactPatch, NewContact},
  entity::Entity,
  permission::Role,
  record::{Record, Value},
  store::Repository,
  user::User,
};

use crate::{ConnectionProvider, Error, SqliteRepository, Written, latest_version};

fn provider() -> ConnectionProvider {
  let provider = ConnectionProvider::in_memory().expect("in-memory store");
  provider.ensure_schema().expect("schema");
  provider
}

fn contacts(provider: &ConnectionProvider) -> SqliteRepository<Contact> {
  provider.repository().expect("contact repository")
}

fn users(provider: &ConnectionProvider) -> SqliteRepository<User> {
  provider.repository().expect("user repository")
}

fn contact(name: &str) -> Contact {
  Contact::new(NewContact::named(name)).unwrap()
}

// ─── Connection provider ─────────────────────────────────────────────────────

#[test]
fn ensure_schema_is_idempotent() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Ana");
  repo.save(&mut c).unwrap();

  p.ensure_schema().unwrap();
  p.ensure_schema().unwrap();

  assert_eq!(repo.find_all().unwrap().len(), 1);
  let version = p
    .open()
    .unwrap()
    .execute_read("SELECT user_version FROM pragma_user_version", &[])
    .unwrap();
  assert_eq!(version[0].integer("user_version").unwrap(), i64::from(latest_version()));
}

#[test]
fn unreachable_store_is_storage_unavailable() {
  let p = ConnectionProvider::file("/nonexistent-abm-dir/nested/store.db");
  assert!(matches!(p.ensure_schema(), Err(Error::StorageUnavailable { .. })));
  assert!(matches!(p.open(), Err(Error::StorageUnavailable { .. })));
}

#[test]
fn newer_schema_is_refused() {
  let p = provider();
  p.open()
    .unwrap()
    .execute_write("PRAGMA user_version = 99", &[])
    .unwrap();

  let err = p.ensure_schema().unwrap_err();
  assert!(matches!(
    err,
    Error::UnsupportedSchemaVersion { found: 99, supported } if supported == latest_version()
  ));
}

#[test]
fn memory_providers_are_isolated() {
  let a = provider();
  let b = provider();
  contacts(&a).save(&mut contact("Ana")).unwrap();
  assert!(contacts(&b).find_all().unwrap().is_empty());
}

#[test]
fn file_store_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("abm.db");

  let id = {
    let p = ConnectionProvider::file(&path);
    p.ensure_schema().unwrap();
    let mut repo = contacts(&p);
    let mut c = contact("Ana");
    let id = repo.save(&mut c).unwrap();
    repo.close().unwrap();
    id
  };

  let p = ConnectionProvider::file(&path);
  p.ensure_schema().unwrap();
  let found = contacts(&p).find_by_id(id).unwrap().unwrap();
  assert_eq!(found.name(), "Ana");
}

// ─── Schema verification ─────────────────────────────────────────────────────

#[test]
fn declared_entities_match_physical_tables() {
  let p = provider();
  p.verify_entity::<Contact>().unwrap();
  p.verify_entity::<User>().unwrap();
}

#[test]
fn drifted_table_is_a_schema_mismatch() {
  let p = ConnectionProvider::in_memory().unwrap();
  p.open()
    .unwrap()
    .execute_write("CREATE TABLE contacts (id INTEGER PRIMARY KEY, name TEXT, mobile TEXT)", &[])
    .unwrap();

  let err = p.verify_entity::<Contact>().unwrap_err();
  assert!(matches!(err, Error::SchemaMismatch { table: "contacts", .. }));
}

#[test]
fn missing_table_is_a_schema_mismatch() {
  let p = ConnectionProvider::in_memory().unwrap();
  assert!(matches!(
    p.verify_entity::<User>(),
    Err(Error::SchemaMismatch { table: "users", .. })
  ));
}

// ─── DAO ─────────────────────────────────────────────────────────────────────

#[test]
fn dao_rows_are_addressed_by_name() {
  let p = provider();
  let dao = p.open().unwrap();
  let Written { rows_affected, last_insert_id } = dao
    .execute_write(
      "INSERT INTO contacts (name, email) VALUES (?1, ?2)",
      &[Value::from("Ana"), Value::from("ana@mail.com")],
    )
    .unwrap();
  assert_eq!(rows_affected, 1);

  let rows = dao
    .execute_read(
      "SELECT email, name, id FROM contacts WHERE id = ?1",
      &[Value::Integer(last_insert_id)],
    )
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].text("name").unwrap(), "Ana");
  assert_eq!(rows[0].text("email").unwrap(), "ana@mail.com");
  assert_eq!(rows[0].integer("id").unwrap(), last_insert_id);
}

#[test]
fn dao_read_without_match_is_empty() {
  let p = provider();
  let rows = p
    .open()
    .unwrap()
    .execute_read("SELECT * FROM contacts WHERE id = ?1", &[Value::Integer(42)])
    .unwrap();
  assert!(rows.is_empty());
}

#[test]
fn placeholders_keep_values_out_of_sql() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Robert'); DROP TABLE contacts;--");
  let id = repo.save(&mut c).unwrap();

  assert_eq!(repo.find_by_id(id).unwrap().unwrap().name(), c.name());
  p.verify_entity::<Contact>().unwrap();
}

#[test]
fn store_constraint_is_translated() {
  let p = provider();
  let err = p
    .open()
    .unwrap()
    .execute_write("INSERT INTO contacts (name) VALUES (?1)", &[Value::Null])
    .unwrap_err();
  assert!(err.is_constraint_violation());
  assert!(matches!(err, Error::Constraint { .. }));
}

#[test]
fn dao_read_refuses_mutating_statements() {
  let p = provider();
  let repo = contacts(&p);
  repo.save(&mut contact("Ana")).unwrap();

  let err = repo
    .dao()
    .execute_read("DELETE FROM contacts", &[])
    .unwrap_err();
  assert!(matches!(err, Error::NotReadOnly { .. }));
  assert_eq!(repo.find_all().unwrap().len(), 1);
}

#[test]
fn closed_dao_refuses_work() {
  let p = provider();
  let mut dao = p.open().unwrap();
  dao.close().unwrap();
  dao.close().unwrap();

  assert!(!dao.is_open());
  assert!(matches!(dao.execute_read("SELECT 1", &[]), Err(Error::Closed)));
  assert!(matches!(dao.execute_write("SELECT 1", &[]), Err(Error::Closed)));
}

// ─── Repository: contacts ────────────────────────────────────────────────────

#[test]
fn save_assigns_id_and_round_trips() {
  let p = provider();
  let repo = contacts(&p);

  let mut c = Contact::new(
    NewContact::named("Ana")
      .email("ana@mail.com")
      .phone("555-0000"),
  )
  .unwrap();
  let id = repo.save(&mut c).unwrap();

  assert!(id > 0);
  assert_eq!(c.id(), Some(id));

  let found = repo.find_by_id(id).unwrap().expect("saved contact");
  assert_eq!(found, c);
}

#[test]
fn save_twice_is_refused() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Ana");
  let id = repo.save(&mut c).unwrap();

  let err = repo.save(&mut c).unwrap_err();
  assert!(matches!(err, Error::AlreadyPersisted { table: "contacts", id: dup } if dup == id));
  assert_eq!(repo.find_all().unwrap().len(), 1);
}

#[test]
fn find_by_id_missing_is_none() {
  let p = provider();
  assert!(contacts(&p).find_by_id(999).unwrap().is_none());
}

#[test]
fn update_overwrites_row() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Juan");
  let id = repo.save(&mut c).unwrap();

  c.set_email(Some("juan@mail.com".into()));
  repo.update(&c).unwrap();

  let found = repo.find_by_id(id).unwrap().unwrap();
  assert_eq!(found.email(), Some("juan@mail.com"));
}

#[test]
fn update_of_missing_row_is_not_found() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Ana");
  let id = repo.save(&mut c).unwrap();
  assert!(repo.delete(id).unwrap());

  c.set_phone(Some("555".into()));
  let err = repo.update(&c).unwrap_err();
  assert!(matches!(err, Error::NotFound { table: "contacts", id: missing } if missing == id));
  assert!(repo.find_all().unwrap().is_empty());
}

#[test]
fn update_of_unsaved_entity_is_refused() {
  let p = provider();
  let err = contacts(&p).update(&contact("Ana")).unwrap_err();
  assert!(matches!(err, Error::NotPersisted { table: "contacts" }));
}

#[test]
fn delete_is_idempotent() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Ana");
  let id = repo.save(&mut c).unwrap();

  assert!(repo.delete(id).unwrap());
  assert!(!repo.delete(id).unwrap());
  assert!(!repo.delete(id).unwrap());
  assert!(repo.find_by_id(id).unwrap().is_none());
}

#[test]
fn remove_consumes_the_entity() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Ana");
  let id = repo.save(&mut c).unwrap();

  assert!(repo.remove(c).unwrap());
  assert!(repo.find_by_id(id).unwrap().is_none());
  assert!(!repo.remove(contact("never saved")).unwrap());
}

#[test]
fn find_all_is_stable_without_writes() {
  let p = provider();
  let repo = contacts(&p);
  for name in ["Ana", "Juan", "Luz", "Pedro"] {
    repo.save(&mut contact(name)).unwrap();
  }
  repo.delete(2).unwrap();

  let ids = |all: Vec<Contact>| all.iter().filter_map(Contact::id).collect::<Vec<_>>();
  let first = ids(repo.find_all().unwrap());
  let second = ids(repo.find_all().unwrap());

  assert_eq!(first.len(), 3);
  assert_eq!(first, second);
}

#[test]
fn find_by_declared_column() {
  let p = provider();
  let repo = contacts(&p);
  repo.save(&mut contact("Ana")).unwrap();
  repo.save(&mut contact("Juan")).unwrap();
  repo.save(&mut contact("Ana")).unwrap();

  let anas = repo.find_by("name", Value::from("Ana")).unwrap();
  assert_eq!(anas.len(), 2);
  assert!(anas.iter().all(|c| c.name() == "Ana"));
}

#[test]
fn find_by_undeclared_column_is_refused() {
  let p = provider();
  let err = contacts(&p)
    .find_by("name = name OR 1", Value::Integer(1))
    .unwrap_err();
  assert!(matches!(err, Error::UndeclaredColumn { table: "contacts", .. }));
}

#[test]
fn invalid_entity_never_reaches_the_store() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Ana");
  repo.save(&mut c).unwrap();

  // Bypass the setter to fabricate an invalid row.
  let mut record = c.to_record();
  record.set("id", c.id().unwrap());
  record.set("name", "  ");
  let broken = Contact::from_record(&record).unwrap();

  let err = repo.update(&broken).unwrap_err();
  assert!(err.is_constraint_violation());
  assert_eq!(repo.find_by_id(c.id().unwrap()).unwrap().unwrap().name(), "Ana");
}

#[test]
fn timestamps_survive_update() {
  let p = provider();
  let repo = contacts(&p);
  let mut c = contact("Ana");
  let id = repo.save(&mut c).unwrap();
  let stored = repo.find_by_id(id).unwrap().unwrap();

  c.set_phone(Some("555-1234".into()));
  repo.update(&c).unwrap();
  let reloaded = repo.find_by_id(id).unwrap().unwrap();

  assert_eq!(reloaded.created_at(), stored.created_at());
  assert!(reloaded.updated_at() > stored.updated_at());
}

#[test]
fn rows_with_null_or_offsetless_stamps_still_load() {
  let p = provider();
  let repo = contacts(&p);
  repo.save(&mut contact("Ana")).unwrap();

  let dao = repo.dao();
  let bare = dao
    .execute_write("INSERT INTO contacts (name) VALUES ('Juan')", &[])
    .unwrap()
    .last_insert_id;
  let naive = dao
    .execute_write(
      "INSERT INTO contacts (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
      &[Value::from("Luz"), Value::from("2025-09-16T12:00:00.123456")],
    )
    .unwrap()
    .last_insert_id;

  assert_eq!(repo.find_all().unwrap().len(), 3);

  let juan = repo.find_by_id(bare).unwrap().unwrap();
  assert_eq!(juan.name(), "Juan");
  assert_eq!(juan.created_at(), juan.updated_at());

  let luz = repo.find_by_id(naive).unwrap().unwrap();
  assert_eq!(
    abm_core::audit::encode_dt(luz.created_at()),
    "2025-09-16T12:00:00.123456Z"
  );

  // Rewriting a legacy row stores canonical stamps.
  let mut luz = luz;
  luz.set_phone(Some("555".into()));
  repo.update(&luz).unwrap();
  let rows = dao
    .execute_read("SELECT created_at FROM contacts WHERE id = ?1", &[Value::Integer(naive)])
    .unwrap();
  assert_eq!(rows[0].text("created_at").unwrap(), "2025-09-16T12:00:00.123456Z");
}

#[test]
fn contact_end_to_end() {
  let p = provider();
  let repo = contacts(&p);

  let mut ana = Contact::new(NewContact::named("Ana").email("ana@mail.com")).unwrap();
  let id = repo.save(&mut ana).unwrap();
  assert!(id > 0);

  ana.apply(ContactPatch::default().phone("555-1234")).unwrap();
  repo.update(&ana).unwrap();

  let found = repo.find_by_id(id).unwrap().unwrap();
  assert_eq!(found.phone(), Some("555-1234"));
  assert_eq!(found.name(), "Ana");
  assert_eq!(found.email(), Some("ana@mail.com"));

  assert!(repo.delete(id).unwrap());
  assert!(repo.find_by_id(id).unwrap().is_none());
}

// ─── Repository: users ───────────────────────────────────────────────────────

#[test]
fn user_round_trip_keeps_role_and_last_access() {
  let p = provider();
  let repo = users(&p);

  let mut admin = User::admin("root", "s3cret").unwrap();
  assert!(admin.login("root", "s3cret"));
  let id = repo.save(&mut admin).unwrap();

  let found = repo.find_by_id(id).unwrap().unwrap();
  assert_eq!(found.username(), "root");
  assert_eq!(found.role(), Role::Admin);
  assert_eq!(found.last_access(), admin.last_access());
  assert_eq!(found.password_hash(), admin.password_hash());
  assert!(!found.is_logged_in(), "session flag is not persisted");
}

#[test]
fn unknown_role_in_store_is_reported() {
  let p = provider();
  let repo = users(&p);
  let mut user = User::basic("ana", "1234").unwrap();
  let id = repo.save(&mut user).unwrap();

  repo
    .dao()
    .execute_write(
      "UPDATE users SET role = ?1 WHERE id = ?2",
      &[Value::from("owner"), Value::Integer(id)],
    )
    .unwrap();

  let err = repo.find_by_id(id).unwrap_err();
  assert!(matches!(err, Error::Core(abm_core::Error::UnknownRole(_))));
}

// ─── Repository: declarations ────────────────────────────────────────────────

struct Misdeclared;

impl Entity for Misdeclared {
  const TABLE: &'static str = "contacts";
  const COLUMNS: &'static [&'static str] = &["name", "id"];

  fn id(&self) -> Option<i64> { None }
  fn assign_id(&mut self, _: i64) {}
  fn to_record(&self) -> Record { Record::new() }
  fn from_record(_: &Record) -> abm_core::Result<Self> { Ok(Self) }
}

#[test]
fn misdeclared_entity_gets_no_repository() {
  let p = provider();
  let err = p.repository::<Misdeclared>().err().expect("declaration error");
  assert!(matches!(err, Error::Core(abm_core::Error::Declaration { .. })));
}

struct Sloppy;

impl Entity for Sloppy {
  const TABLE: &'static str = "contacts";
  const COLUMNS: &'static [&'static str] = &["id", "name", "phone"];

  fn id(&self) -> Option<i64> { None }
  fn assign_id(&mut self, _: i64) {}
  fn to_record(&self) -> Record {
    Record::new().with("name", "x").with("mobile", "555")
  }
  fn from_record(_: &Record) -> abm_core::Result<Self> { Ok(Self) }
}

#[test]
fn record_must_match_declaration_by_name() {
  let p = provider();
  let repo = p.repository::<Sloppy>().unwrap();
  let err = repo.save(&mut Sloppy).unwrap_err();
  assert!(matches!(err, Error::UndeclaredColumn { ref column, .. } if column == "mobile"));
  assert!(contacts(&p).find_all().unwrap().is_empty());
}
