#![allow(dead_code)]

use errorly::model::{Project, User};
use errorly::storage::{ProjectStore, SqliteStorage};
use errorly::util::id::{Id, IdConfig, IdGenerator};
use std::sync::Once;
use tempfile::TempDir;

pub mod cli;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        errorly::logging::init_test_logging();
    });
}

pub fn test_db() -> SqliteStorage {
    init_test_logging();
    SqliteStorage::open_memory().expect("Failed to create test database")
}

pub fn test_db_with_dir() -> (SqliteStorage, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("errorly.db");
    let storage = SqliteStorage::open(&db_path).expect("Failed to create test database");
    (storage, dir)
}

pub fn test_ids() -> IdGenerator {
    IdGenerator::new(IdConfig::default()).expect("default shard is valid")
}

pub fn owner() -> User {
    User::new(Id(100), "ava")
}

/// A stored project owned by [`owner`] with contributor 200.
pub fn seeded_project(storage: &SqliteStorage, ids: &IdGenerator) -> Project {
    let mut project = Project::new(ids.next(), "Welcomer", owner().id);
    project.settings.contributor_ids.push(Id(200));
    storage.insert_project(&project).expect("insert project");
    project
}
