//! Durable token storage

use ratescrape::queue::TokenStore;
use serde_json::{Value, json};
use tempfile::TempDir;

#[test]
fn test_missing_file_has_no_token() {
    let dir = TempDir::new().unwrap();
    let store = TokenStore::new(dir.path().join("absent.json"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_save_creates_parents_and_reloads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("storage.json");
    let store = TokenStore::new(&path);

    store.save("abc").unwrap();
    store.save("def").unwrap();

    assert_eq!(TokenStore::new(&path).load().unwrap().as_deref(), Some("def"));
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn test_other_keys_survive_a_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, r#"{"theme":"dark","authToken":"old"}"#).unwrap();

    TokenStore::new(&path).save("new").unwrap();

    let stored: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(stored, json!({"theme": "dark", "authToken": "new"}));
}

#[test]
fn test_blank_file_is_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "\n  ").unwrap();
    assert_eq!(TokenStore::new(&path).load().unwrap(), None);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");

    std::fs::write(&path, "{not json").unwrap();
    assert!(TokenStore::new(&path).load().is_err());

    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(TokenStore::new(&path).save("x").is_err());
}
