//! Tests for Store
//!
//! These tests verify:
//! - Put/get round trips and not-found handling
//! - Lifecycle rules (open once, close once, no data ops outside open)
//! - Open options (create_if_missing / error_if_exists) and locking
//! - Close refused while cursors are outstanding
//! - Compaction leaves observable contents unchanged
//! - Persistence across reopen

use kvbench::engine::{MemoryEngine, MemoryVolume};
use kvbench::error::Resource;
use kvbench::store::StoreState;
use kvbench::{Engine, EngineError, IteratorOptions, KvError, OpenOptions, Store};

// =============================================================================
// Helper Functions
// =============================================================================

async fn open_memory_store() -> Store<MemoryEngine> {
    let mut store = Store::new(MemoryEngine::in_memory().unwrap());
    store.open(OpenOptions::default()).await.unwrap();
    store
}

async fn snapshot<E: Engine>(store: &mut Store<E>) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut cursor = store.iterator(IteratorOptions::new()).unwrap();
    let mut entries = Vec::new();
    while let Some(entry) = cursor.next().await.unwrap() {
        entries.push((entry.key.to_vec(), entry.value.to_vec()));
    }
    cursor.end().await.unwrap();
    entries
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[tokio::test]
async fn test_store_put_get() {
    let mut store = open_memory_store().await;

    store.put("hello", "world").await.unwrap();
    let value = store.get("hello").await.unwrap();

    assert_eq!(value.as_deref(), Some(&b"world"[..]));
}

#[tokio::test]
async fn test_store_scenario_two_writes_one_miss() {
    let mut store = open_memory_store().await;

    store.put(0.to_string(), "abc0").await.unwrap();
    store.put(1.to_string(), "abc1").await.unwrap();

    assert_eq!(store.get("0").await.unwrap().as_deref(), Some(&b"abc0"[..]));
    assert_eq!(store.get("1").await.unwrap().as_deref(), Some(&b"abc1"[..]));
    assert_eq!(store.get("2").await.unwrap(), None);
}

#[tokio::test]
async fn test_store_round_trip_many_keys() {
    let mut store = open_memory_store().await;

    for i in 0..500u64 {
        let value = format!("abc{i}");
        store.put(i.to_string(), &value).await.unwrap();
        let read = store.get(i.to_string()).await.unwrap();
        assert_eq!(read.as_deref(), Some(value.as_bytes()));
    }
}

#[tokio::test]
async fn test_store_found_empty_is_not_not_found() {
    let mut store = open_memory_store().await;

    store.put("empty", "").await.unwrap();

    assert_eq!(store.get("empty").await.unwrap().as_deref(), Some(&b""[..]));
    assert_eq!(store.get("absent").await.unwrap(), None);
}

#[tokio::test]
async fn test_store_overwrite() {
    let mut store = open_memory_store().await;

    store.put("key", "value1").await.unwrap();
    store.put("key", "value2").await.unwrap();

    assert_eq!(store.get("key").await.unwrap().as_deref(), Some(&b"value2"[..]));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_store_operations_before_open_fail() {
    let mut store = Store::new(MemoryEngine::in_memory().unwrap());

    let put = store.put("a", "1").await;
    let get = store.get("a").await;
    let iter = store.iterator(IteratorOptions::new());
    let close = store.close().await;

    assert!(matches!(put, Err(KvError::Write { source: EngineError::NotOpen, .. })));
    assert!(matches!(get, Err(KvError::Read { source: EngineError::NotOpen, .. })));
    assert!(matches!(iter, Err(KvError::Iteration { source: EngineError::NotOpen })));
    assert!(matches!(
        close,
        Err(KvError::Close { resource: Resource::Store, source: EngineError::NotOpen })
    ));
    assert_eq!(store.state(), StoreState::New);
}

#[tokio::test]
async fn test_store_open_twice_fails() {
    let mut store = open_memory_store().await;

    let second = store.open(OpenOptions::default()).await;

    assert!(matches!(second, Err(KvError::Open { source: EngineError::AlreadyOpen, .. })));
    assert!(store.is_open());
}

#[tokio::test]
async fn test_store_close_twice_fails() {
    let mut store = open_memory_store().await;

    store.close().await.unwrap();
    let second = store.close().await;

    assert!(matches!(
        second,
        Err(KvError::Close { resource: Resource::Store, source: EngineError::Closed })
    ));
    assert_eq!(store.state(), StoreState::Closed);
}

#[tokio::test]
async fn test_store_operations_after_close_fail() {
    let mut store = open_memory_store().await;
    store.close().await.unwrap();

    let put = store.put("a", "1").await;
    let compact = store.compact().await;
    let reopen = store.open(OpenOptions::default()).await;

    assert!(matches!(put, Err(KvError::Write { source: EngineError::Closed, .. })));
    assert!(matches!(compact, Err(KvError::Compaction { source: EngineError::Closed, .. })));
    assert!(matches!(reopen, Err(KvError::Open { source: EngineError::Closed, .. })));
}

#[tokio::test]
async fn test_store_errors_name_the_key() {
    let mut store = Store::new(MemoryEngine::in_memory().unwrap());

    let err = store.put("user:42", "x").await.unwrap_err();

    assert!(err.to_string().contains("user:42"));
    assert!(matches!(err.cause(), Some(EngineError::NotOpen)));
}

#[tokio::test]
async fn test_store_close_refused_with_outstanding_cursor() {
    let mut store = open_memory_store().await;
    let mut cursor = store.iterator(IteratorOptions::new()).unwrap();
    assert_eq!(store.outstanding_cursors(), 1);

    let refused = store.close().await;
    assert!(matches!(
        refused,
        Err(KvError::Close { source: EngineError::OutstandingCursors(1), .. })
    ));
    assert!(store.is_open());

    cursor.end().await.unwrap();
    assert_eq!(store.outstanding_cursors(), 0);
    store.close().await.unwrap();
}

// =============================================================================
// Open Options Tests
// =============================================================================

#[tokio::test]
async fn test_store_open_missing_without_create_fails() {
    let mut store = Store::new(MemoryEngine::on_volume(&MemoryVolume::new()).unwrap());
    let options = OpenOptions::builder().create_if_missing(false).build();

    let result = store.open(options).await;

    assert!(matches!(result, Err(KvError::Open { source: EngineError::Missing(_), .. })));
    assert_eq!(store.state(), StoreState::New);
}

#[tokio::test]
async fn test_store_open_existing_with_error_if_exists_fails() {
    let volume = MemoryVolume::new();
    let mut first = Store::new(MemoryEngine::on_volume(&volume).unwrap());
    first.open(OpenOptions::default()).await.unwrap();
    first.close().await.unwrap();

    let mut second = Store::new(MemoryEngine::on_volume(&volume).unwrap());
    let options = OpenOptions::builder().error_if_exists(true).build();
    let result = second.open(options).await;

    assert!(matches!(
        result,
        Err(KvError::Open { source: EngineError::AlreadyExists(_), .. })
    ));
}

#[tokio::test]
async fn test_store_second_opener_is_locked_out() {
    let volume = MemoryVolume::new();
    let mut first = Store::new(MemoryEngine::on_volume(&volume).unwrap());
    let mut second = Store::new(MemoryEngine::on_volume(&volume).unwrap());

    first.open(OpenOptions::default()).await.unwrap();
    let result = second.open(OpenOptions::default()).await;

    assert!(matches!(result, Err(KvError::Open { source: EngineError::Locked(_), .. })));
}

#[tokio::test]
async fn test_store_reopen_sees_previous_writes() {
    let volume = MemoryVolume::new();

    let mut first = Store::new(MemoryEngine::on_volume(&volume).unwrap());
    first.open(OpenOptions::default()).await.unwrap();
    first.put("persist", "me").await.unwrap();
    first.close().await.unwrap();

    let mut second = Store::new(MemoryEngine::on_volume(&volume).unwrap());
    second.open(OpenOptions::default()).await.unwrap();

    assert_eq!(second.get("persist").await.unwrap().as_deref(), Some(&b"me"[..]));
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[tokio::test]
async fn test_compaction_on_empty_store() {
    let mut store = open_memory_store().await;

    store.compact().await.unwrap();

    assert!(snapshot(&mut store).await.is_empty());
}

#[tokio::test]
async fn test_compaction_preserves_single_entry() {
    let mut store = open_memory_store().await;
    store.put("only", "one").await.unwrap();

    let before = snapshot(&mut store).await;
    store.compact().await.unwrap();
    let after = snapshot(&mut store).await;

    assert_eq!(before, after);
    assert_eq!(store.get("only").await.unwrap().as_deref(), Some(&b"one"[..]));
}

#[tokio::test]
async fn test_compaction_preserves_many_entries() {
    let mut store = open_memory_store().await;
    for i in 0..10_500u64 {
        store.put(i.to_string(), format!("abc{i}")).await.unwrap();
    }

    let before = snapshot(&mut store).await;
    store.compact().await.unwrap();
    let after = snapshot(&mut store).await;

    assert_eq!(before.len(), 10_500);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_compaction_of_sub_range() {
    let mut store = open_memory_store().await;
    store.put("a", "1").await.unwrap();
    store.put("m", "2").await.unwrap();

    store.compact_range(Some(&b"a"[..]), Some(&b"n"[..])).await.unwrap();
    store.compact_range(None, Some(&b"b"[..])).await.unwrap();
    store.compact_range(Some(&b"b"[..]), None).await.unwrap();

    assert_eq!(store.get("m").await.unwrap().as_deref(), Some(&b"2"[..]));
}

#[tokio::test]
async fn test_compaction_rejects_inverted_range() {
    let mut store = open_memory_store().await;

    let result = store.compact_range(Some(&b"z"[..]), Some(&b"a"[..])).await;

    match result {
        Err(KvError::Compaction { range, source: EngineError::InvalidRange }) => {
            assert_eq!(range, "[z, a)");
        }
        other => panic!("expected compaction error, got {other:?}"),
    }
}

// =============================================================================
// Sled Backend Tests
// =============================================================================

#[cfg(feature = "sled")]
mod sled_backend {
    use std::path::Path;

    use kvbench::{EngineError, KvError, OpenOptions, SledEngine, Store};
    use tempfile::TempDir;

    use super::snapshot;

    async fn open_sled_store(path: &Path) -> Store<SledEngine> {
        let mut store = Store::new(SledEngine::new(path).unwrap());
        store.open(OpenOptions::default()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_sled_put_get_close() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db");
        let mut store = Store::new(SledEngine::new(&path).unwrap());

        store.open(OpenOptions::default()).await.unwrap();
        store.put("0", "abc0").await.unwrap();
        store.put("1", "abc1").await.unwrap();

        assert_eq!(store.get("0").await.unwrap().as_deref(), Some(&b"abc0"[..]));
        assert_eq!(store.get("2").await.unwrap(), None);
        store.compact().await.unwrap();
        assert_eq!(store.get("1").await.unwrap().as_deref(), Some(&b"abc1"[..]));
        store.close().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_sled_missing_without_create() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent");
        let mut store = Store::new(SledEngine::new(&path).unwrap());
        let options = OpenOptions::builder().create_if_missing(false).build();

        let result = store.open(options).await;

        match result {
            Err(KvError::Open { path: reported, source: EngineError::Missing(_) }) => {
                assert_eq!(reported, path);
            }
            other => panic!("expected open error, got {other:?}"),
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sled_compaction_on_empty_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_sled_store(&temp_dir.path().join("db")).await;

        store.compact().await.unwrap();

        assert!(snapshot(&mut store).await.is_empty());
        assert_eq!(store.get("0").await.unwrap(), None);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sled_compaction_preserves_single_entry() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_sled_store(&temp_dir.path().join("db")).await;
        store.put("only", "one").await.unwrap();

        let before = snapshot(&mut store).await;
        store.compact().await.unwrap();
        let after = snapshot(&mut store).await;

        assert_eq!(before, after);
        assert_eq!(store.get("only").await.unwrap().as_deref(), Some(&b"one"[..]));
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sled_compaction_preserves_many_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_sled_store(&temp_dir.path().join("db")).await;
        for i in 0..10_500u64 {
            store.put(i.to_string(), format!("abc{i}")).await.unwrap();
        }

        let before = snapshot(&mut store).await;
        store.compact().await.unwrap();
        let after = snapshot(&mut store).await;

        assert_eq!(before.len(), 10_500);
        assert_eq!(before, after);
        for i in [0u64, 5_000, 10_499] {
            let value = store.get(i.to_string()).await.unwrap();
            assert_eq!(value.as_deref(), Some(format!("abc{i}").as_bytes()));
        }
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_sled_reopen_sees_previous_writes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("db");

        let mut first = open_sled_store(&path).await;
        for i in 0..1_000u64 {
            first.put(i.to_string(), format!("abc{i}")).await.unwrap();
        }
        first.compact().await.unwrap();
        first.close().await.unwrap();
        drop(first);

        let mut second = Store::new(SledEngine::new(&path).unwrap());
        let options = OpenOptions::builder().create_if_missing(false).build();
        second.open(options).await.unwrap();

        assert_eq!(second.get("999").await.unwrap().as_deref(), Some(&b"abc999"[..]));
        assert_eq!(snapshot(&mut second).await.len(), 1_000);
        second.close().await.unwrap();
    }
}
