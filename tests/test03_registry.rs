mod common;

use std::fs;
use std::sync::Arc;
use std::thread;

use common::people;
use sql_conduit::prelude::*;
use tempfile::tempdir;

#[test]
fn named_statements_come_from_the_registry() -> Result<(), SqlConduitError> {
    let provider = people();
    let source = provider.source();
    source
        .registry()
        .register("all_people", "SELECT * FROM people")?;
    let ids: Vec<i64> = source
        .named("all_people")?
        .execute_for_each_row(|row| row.get("id"))?
        .collect::<Result<_, _>>()?;
    assert_eq!(ids, vec![1, 2, 3]);

    let err = source.named("missing").unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[test]
fn clones_share_one_registry() -> Result<(), SqlConduitError> {
    let source = people().source();
    let clone = source.clone();
    clone.registry().register("q", "SELECT 1")?;
    assert!(source.registry().contains("q"));
    assert!(!people().source().registry().contains("q"));
    Ok(())
}

#[test]
fn load_directory_walks_subdirectories() -> Result<(), SqlConduitError> {
    let dir = tempdir()?;
    fs::write(dir.path().join("top.sql"), "SELECT 1")?;
    fs::create_dir(dir.path().join("nested"))?;
    fs::write(dir.path().join("nested").join("inner.SQL"), "SELECT 2")?;
    fs::write(dir.path().join("notes.txt"), "not a query")?;

    let registry = QueryRegistry::new();
    let loaded = registry.load_directory(dir.path(), ".sql")?;
    assert_eq!(loaded, 2);
    assert_eq!(registry.names(), vec!["inner", "top"]);
    assert_eq!(registry.find("inner")?, "SELECT 2");
    Ok(())
}

#[cfg(unix)]
#[test]
fn load_directory_does_not_reenter_symlink_loops() -> Result<(), SqlConduitError> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.sql"), "SELECT 1")?;
    fs::create_dir(dir.path().join("sub"))?;
    std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("loop"))?;

    let registry = QueryRegistry::new();
    assert_eq!(registry.load_directory(dir.path(), "sql")?, 1);
    assert_eq!(registry.names(), vec!["a"]);
    Ok(())
}

#[test]
fn load_directory_reports_missing_dirs() {
    let registry = QueryRegistry::new();
    let err = registry
        .load_directory("/definitely/not/here", "sql")
        .unwrap_err();
    assert!(matches!(err, SqlConduitError::IoError(_)));
}

#[test]
fn concurrent_registration_is_safe() {
    let registry = Arc::new(QueryRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..50 {
                    registry
                        .register(&format!("q{t}_{i}"), "SELECT 1")
                        .unwrap();
                    assert!(registry.find(&format!("q{t}_{i}")).is_ok());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.count(), 400);
}

#[test]
fn empty_names_are_rejected() {
    let registry = QueryRegistry::new();
    assert!(matches!(
        registry.register("", "SELECT 1"),
        Err(SqlConduitError::InvalidArgument(_))
    ));
    assert_eq!(registry.count(), 0);
}
