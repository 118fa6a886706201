#![cfg(feature = "sqlite")]

use sql_conduit::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

#[derive(Debug, Default, PartialEq)]
struct Pet {
    id: i64,
    name: String,
    weight: f64,
}

field_mapped!(Pet { id, name, weight });

fn seeded_source(prefix: &str) -> Result<DataSource, SqlConduitError> {
    let source = DataSource::builder(unique_db_path(prefix)).build_sqlite()?;
    source
        .sql("CREATE TABLE pets (id INTEGER PRIMARY KEY, name TEXT, weight REAL)")?
        .execute_without_result()?;
    for (id, name, weight) in [(1, Some("rex"), 12.5), (2, Some("tom"), 4.0), (3, None, 1.0)] {
        source
            .sql("INSERT INTO pets (id, name, weight) VALUES (@id, @name, @weight)")?
            .attach_parameter("id", id)?
            .attach_parameter("name", name)?
            .attach_parameter("weight", weight)?
            .execute_without_result()?;
    }
    Ok(source)
}

#[test]
fn rows_round_trip_through_sqlite() -> Result<(), SqlConduitError> {
    let source = seeded_source("round_trip")?;
    let names: Vec<String> = source
        .sql("SELECT name FROM pets WHERE weight > @min ORDER BY id")?
        .attach_parameter("@min", 2.0)?
        .execute_for_each_row(|row| row.get("name"))?
        .collect::<Result<_, _>>()?;
    assert_eq!(names, vec!["rex", "tom"]);

    let count: i64 = source.sql("SELECT COUNT(*) FROM pets")?.execute_for_scalar()?;
    assert_eq!(count, 3);
    Ok(())
}

#[test]
fn null_text_reads_as_empty_string() -> Result<(), SqlConduitError> {
    let source = seeded_source("nulls")?;
    let name: String = source
        .sql("SELECT name FROM pets WHERE id = @id")?
        .attach_parameter("@id", 3)?
        .execute_for_first_row(|row| row.get("name"))?;
    assert_eq!(name, "");
    Ok(())
}

#[test]
fn early_drop_leaves_database_usable() -> Result<(), SqlConduitError> {
    let source = seeded_source("early_drop")?;
    let statement = source.sql("SELECT id FROM pets ORDER BY id")?;
    let first = statement
        .execute_for_each_row(|row| row.get::<i64>("id"))?
        .next()
        .transpose()?;
    assert_eq!(first, Some(1));

    let affected = source
        .sql("UPDATE pets SET weight = weight + 1")?
        .execute_without_result()?;
    assert_eq!(affected, 3);
    Ok(())
}

#[test]
fn mapped_rows_and_tables() -> Result<(), SqlConduitError> {
    let source = seeded_source("mapped")?;
    let map = column_map([("id", "id"), ("name", "name"), ("weight", "weight")]);
    let pets: Vec<Pet> = source
        .sql("SELECT * FROM pets ORDER BY id")?
        .execute_for_each_row_mapped(&map)?
        .collect::<Result<_, _>>()?;
    assert_eq!(
        pets[0],
        Pet {
            id: 1,
            name: "rex".into(),
            weight: 12.5,
        }
    );

    let table = source.sql("SELECT id, name FROM pets ORDER BY id")?.execute_for_table()?;
    assert_eq!(table.len(), 3);
    assert_eq!(
        table.get_column_names().map(|c| c.as_slice().to_vec()),
        Some(vec!["id".to_string(), "name".to_string()])
    );
    assert_eq!(table.results[2].get("name"), Some(&DbValue::Null));
    Ok(())
}

#[test]
fn positional_sql_is_translated_for_sqlite() -> Result<(), SqlConduitError> {
    let path = unique_db_path("positional");
    let source = DataSource::builder(path)
        .translation(true)
        .source_dialect(DialectKind::Positional)
        .build_sqlite()?;
    source
        .sql("CREATE TABLE kv (k TEXT, v INTEGER)")?
        .execute_without_result()?;
    source
        .sql("INSERT INTO kv (k, v) VALUES (?, ?)")?
        .attach_parameter("k", "a")?
        .attach_parameter("v", 7)?
        .execute_without_result()?;
    let v: i64 = source
        .sql("SELECT v FROM kv WHERE k = ?")?
        .attach_parameter("k", "a")?
        .execute_for_scalar()?;
    assert_eq!(v, 7);
    Ok(())
}

#[test]
fn own_named_placeholders_do_not_bind_by_position() -> Result<(), SqlConduitError> {
    let source = seeded_source("no_fallback")?;
    let err = source
        .sql("SELECT name FROM pets WHERE id = @p1")?
        .attach_parameter("@p0", 1)?
        .attach_parameter("@other", 2)?
        .execute_for_scalar::<String>()
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::ExecutionError(_)));
    Ok(())
}

#[test]
fn registered_queries_run_against_sqlite() -> Result<(), SqlConduitError> {
    let source = seeded_source("registry")?;
    source
        .registry()
        .register("heaviest", "SELECT name FROM pets ORDER BY weight DESC")?;
    let name: String = source
        .named("heaviest")?
        .execute_for_first_row(|row| row.get(0usize))?;
    assert_eq!(name, "rex");
    Ok(())
}

#[test]
fn sql_errors_surface_from_the_driver() -> Result<(), SqlConduitError> {
    let source = seeded_source("errors")?;
    let mut rows = source
        .sql("SELECT * FROM no_such_table")?
        .execute_for_each_row(|row| row.get::<i64>(0usize))?;
    assert!(matches!(rows.next(), Some(Err(SqlConduitError::SqliteError(_)))));
    assert!(rows.next().is_none());
    Ok(())
}

#[test]
fn stored_procedures_are_unsupported() -> Result<(), SqlConduitError> {
    let source = seeded_source("procs")?;
    let err = source.procedure("refresh_pets")?.execute_without_result();
    assert!(matches!(err, Err(SqlConduitError::Unimplemented(_))));
    Ok(())
}

#[test]
fn empty_connection_string_is_a_config_error() {
    let err = DataSource::new_sqlite(DataSourceOptions::default()).unwrap_err();
    assert!(matches!(err, SqlConduitError::ConfigError(_)));
}
