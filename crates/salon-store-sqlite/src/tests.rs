//! Integration tests for `SqliteStore` against an in-memory database.

use salon_core::{
  Accessor, AccessorConfig, Record, RecordId,
  actor::Anonymous,
  local::LocalStore,
  remote::{OrderBy, RemoteError, RemoteStore},
};
use serde_json::json;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Key-value ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_missing_key_returns_none() {
  let s = store().await;
  assert_eq!(s.read("salon_clients").await.unwrap(), None);
}

#[tokio::test]
async fn write_then_read() {
  let s = store().await;
  s.write("salon_clients", "[]".into()).await.unwrap();
  assert_eq!(s.read("salon_clients").await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn write_replaces_previous_value() {
  let s = store().await;
  s.write("salon_products", r#"[{"id":"a"}]"#.into()).await.unwrap();
  s.write("salon_products", r#"[{"id":"b"}]"#.into()).await.unwrap();
  assert_eq!(
    s.read("salon_products").await.unwrap().as_deref(),
    Some(r#"[{"id":"b"}]"#)
  );
}

#[tokio::test]
async fn keys_are_isolated() {
  let s = store().await;
  s.write("salon_clients", "[1]".into()).await.unwrap();
  s.write("salon_services", "[2]".into()).await.unwrap();
  assert_eq!(s.read("salon_clients").await.unwrap().as_deref(), Some("[1]"));
  assert_eq!(s.read("salon_services").await.unwrap().as_deref(), Some("[2]"));
}

#[tokio::test]
async fn keys_with_prefix_treats_wildcards_literally() {
  let s = store().await;
  s.write("salon_clients", "[]".into()).await.unwrap();
  s.write("salon_orders", "[]".into()).await.unwrap();
  s.write("salonXother", "[]".into()).await.unwrap();
  s.write("theme", "dark".into()).await.unwrap();

  let keys = s.keys_with_prefix("salon_").await.unwrap();
  assert_eq!(keys, vec!["salon_clients".to_string(), "salon_orders".to_string()]);
}

#[tokio::test]
async fn data_survives_reopen() {
  let dir = std::env::temp_dir().join(format!("salon-store-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("fallback.db");
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.write("salon_clients", r#"[{"id":"x"}]"#.into()).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(
    s.read("salon_clients").await.unwrap().as_deref(),
    Some(r#"[{"id":"x"}]"#)
  );
  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}

// ─── Accessor fallback ───────────────────────────────────────────────────────

/// A remote store where no table exists.
struct EmptySchema;

impl RemoteStore for EmptySchema {
  async fn select(&self, table: &str, _: Option<&OrderBy>) -> Result<Vec<Record>, RemoteError> {
    Err(RemoteError::undefined_table(format!(r#"relation "public.{table}" does not exist"#)))
  }

  async fn insert(&self, table: &str, _: &Record) -> Result<Record, RemoteError> {
    Err(RemoteError::undefined_table(format!(r#"relation "public.{table}" does not exist"#)))
  }

  async fn update(&self, table: &str, _: &RecordId, _: &Record) -> Result<Option<Record>, RemoteError> {
    Err(RemoteError::undefined_table(format!(r#"relation "public.{table}" does not exist"#)))
  }

  async fn delete(&self, table: &str, _: &RecordId) -> Result<(), RemoteError> {
    Err(RemoteError::undefined_table(format!(r#"relation "public.{table}" does not exist"#)))
  }
}

#[tokio::test]
async fn accessor_fallback_persists_through_sqlite() {
  let s = store().await;
  let acc = Accessor::new(EmptySchema, s.clone(), Anonymous, AccessorConfig::default());

  let clients = acc.table("clients");
  assert!(clients.list().await.is_empty());
  let ana = clients
    .insert(Record::try_from(json!({"name": "Ana"})).unwrap())
    .await
    .unwrap();

  // A second handle for the same table sees the same on-device copy.
  let again = acc.table("clients");
  assert_eq!(again.list().await, vec![ana]);

  let raw = s.read("salon_clients").await.unwrap().unwrap();
  let parsed: Vec<Record> = serde_json::from_str(&raw).unwrap();
  assert_eq!(parsed.len(), 1);
}
