use whub_database::{Database, DatabaseError, Migration, SurrealValue, Table, WriteGuard};

#[derive(Debug, Clone, PartialEq, SurrealValue)]
struct NoteRow {
    key: String,
    title: String,
    tags: Vec<String>,
    rating: Option<i64>,
}

fn note(key: &str, title: &str) -> NoteRow {
    NoteRow {
        key: key.to_owned(),
        title: title.to_owned(),
        tags: vec!["calm".to_owned()],
        rating: None,
    }
}

const NOTES: Migration = Migration::new(
    "notes",
    "0001_init",
    "DEFINE TABLE IF NOT EXISTS note SCHEMALESS;
     DEFINE INDEX IF NOT EXISTS note_key ON note FIELDS key UNIQUE;",
);

async fn database(ns: &str) -> Database {
    Database::builder()
        .url("mem://")
        .session(ns, "test")
        .auth("root", "root")
        .migrations([NOTES])
        .init()
        .await
        .expect("mem:// database")
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn table_round_trip() {
    let db = database("roundtrip").await;
    let table = Table::<NoteRow>::new(db, "note");

    table.insert(note("K1", "Breathing")).await.unwrap();
    table.insert(note("K2", "Stretching")).await.unwrap();

    assert_eq!(table.all().await.unwrap().len(), 2);
    assert_eq!(table.find("K1").await.unwrap(), Some(note("K1", "Breathing")));
    assert_eq!(table.find("missing").await.unwrap(), None);

    let mut updated = note("K1", "Box breathing");
    updated.rating = Some(5);
    assert!(table.replace("K1", updated.clone()).await.unwrap());
    assert!(!table.replace("nope", updated.clone()).await.unwrap());
    assert_eq!(table.find("K1").await.unwrap(), Some(updated));

    assert!(table.remove("K2").await.unwrap().is_some());
    assert!(table.remove("K2").await.unwrap().is_none());
    assert_eq!(table.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn increment_is_a_single_update() {
    let db = database("increment").await;
    let table = Table::<NoteRow>::new(db, "note");

    let mut rated = note("K1", "Breathing");
    rated.rating = Some(5);
    table.insert(rated).await.unwrap();

    assert!(table.increment("K1", "rating").await.unwrap());
    assert!(table.increment("K1", "rating").await.unwrap());
    assert!(!table.increment("missing", "rating").await.unwrap());
    assert_eq!(table.find("K1").await.unwrap().unwrap().rating, Some(7));
}

#[tokio::test]
async fn unique_key_index_rejects_duplicates() {
    let db = database("unique").await;
    let table = Table::<NoteRow>::new(db, "note");

    table.insert(note("DUP", "first")).await.unwrap();
    assert!(table.insert(note("DUP", "second")).await.is_err());
}

#[tokio::test]
async fn migrations_are_recorded_once_and_guarded() {
    let db = database("migrate").await;

    let report = db.migrate(&[NOTES]).await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, vec!["notes:0001_init".to_owned()]);

    let mut response = db.query("SELECT VALUE checksum FROM migration").await.unwrap();
    let checksums: Vec<String> = response.take(0).unwrap();
    assert_eq!(checksums, vec![NOTES.checksum()]);

    let edited = Migration::new("notes", "0001_init", "DEFINE TABLE IF NOT EXISTS notes;");
    let err = db.migrate(&[edited]).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Migration { .. }));
}

#[derive(Debug, Clone, SurrealValue)]
struct TitleGuard {
    key: String,
    title: String,
}

fn guard(key: &str, title: &str) -> WriteGuard<TitleGuard> {
    WriteGuard {
        scope: title.to_owned(),
        condition: "title = $guard.title AND key != $guard.key",
        values: TitleGuard { key: key.to_owned(), title: title.to_owned() },
    }
}

#[tokio::test]
async fn guarded_writes_skip_when_the_condition_matches() {
    let db = database("guarded").await;
    let table = Table::<NoteRow>::new(db, "note");
    let insert = |key: &str, title: &str| table.insert_unless(note(key, title), guard(key, title));

    assert!(insert("K1", "Breathing").await.unwrap());
    assert!(!insert("K2", "Breathing").await.unwrap());
    assert!(insert("K3", "Stretching").await.unwrap());
    assert_eq!(table.all().await.unwrap().len(), 2);

    let renamed = note("K3", "Breathing");
    let blocked = table.replace_unless("K3", renamed, guard("K3", "Breathing"));
    assert!(!blocked.await.unwrap());
    assert_eq!(table.find("K3").await.unwrap(), Some(note("K3", "Stretching")));

    let retitled = note("K1", "Box breathing");
    let own = guard("K1", "Box breathing");
    assert!(table.replace_unless("K1", retitled.clone(), own).await.unwrap());
    assert_eq!(table.find("K1").await.unwrap(), Some(retitled));
}

#[tokio::test]
async fn concurrent_guarded_inserts_store_one_row() {
    let db = database("guarded_race").await;
    let table = Table::<NoteRow>::new(db, "note");

    let attempts: Vec<_> = (0..8)
        .map(|n| {
            let table = table.clone();
            let key = format!("R{n}");
            tokio::spawn(async move {
                table.insert_unless(note(&key, "Yoga"), guard(&key, "Yoga")).await
            })
        })
        .collect();
    let mut stored = 0;
    for attempt in attempts {
        if attempt.await.unwrap().unwrap_or(false) {
            stored += 1;
        }
    }

    assert_eq!(stored, 1);
    assert_eq!(table.find_by("title", "Yoga").await.unwrap().len(), 1);
}
