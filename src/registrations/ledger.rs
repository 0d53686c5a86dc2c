//! The registration ledger.
//!
//! This module provides the [`Ledger`], the single source of truth for all
//! registrations. Every mutation is checked, persisted and committed under one
//! lock so that two concurrent requests can never both pass a uniqueness check.

use chrono::Utc;
use log::{debug, info};
use tokio::sync::Mutex;

use crate::registrations::{
    Collision, LedgerError, RegistrationEntry, is_valid_name,
    store::{Snapshot, SnapshotStore},
};

/// In-memory authoritative view of all registrations, backed by a [`SnapshotStore`].
///
/// # Thread Safety
///
/// All operations take the internal lock. Mutations hold it across the
/// invariant checks, the durable save and the in-memory commit, so readers
/// never see an entry whose save has not completed. The ledger performs no
/// network call while holding the lock.
///
/// # Examples
///
/// ```no_run
/// use porter::registrations::{JsonSnapshotStore, Ledger};
///
/// # async fn example() -> Result<(), porter::registrations::LedgerError> {
/// let ledger = Ledger::load(JsonSnapshotStore::new("users.json")).await?;
/// let entry = ledger.register("@steve:example.com", "Steve", "Steve123").await?;
/// assert_eq!(ledger.list_all().await, vec![entry]);
/// # Ok(())
/// # }
/// ```
pub struct Ledger<S: SnapshotStore> {
    /// Registrations in insertion order
    entries: Mutex<Vec<RegistrationEntry>>,
    /// Durable storage for the entries
    store: S,
}

impl<S: SnapshotStore> Ledger<S> {
    /// Loads the ledger from `store`.
    ///
    /// # Errors
    ///
    /// Fails with [`LedgerError::StorageCorrupt`] if the stored snapshot cannot be
    /// parsed and [`LedgerError::StorageUnavailable`] if it cannot be read.
    pub async fn load(store: S) -> Result<Self, LedgerError> {
        let snapshot = store.load().await?;

        Ok(Ledger {
            entries: Mutex::new(snapshot.users),
            store,
        })
    }

    /// Registers `resource_name` for `user_id`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidName`] if the name is not 3 to 16 letters, digits or underscores
    /// - [`LedgerError::AlreadyRegistered`] with [`Collision::User`] if `user_id` already
    ///   has an entry, or [`Collision::Name`] if the name is taken (ignoring case)
    /// - [`LedgerError::StorageUnavailable`] if the new snapshot cannot be saved; the
    ///   ledger is left unchanged
    pub async fn register(
        &self,
        user_id: &str,
        display_tag: &str,
        resource_name: &str,
    ) -> Result<RegistrationEntry, LedgerError> {
        if !is_valid_name(resource_name) {
            debug!("invalid name {:?} from {}", resource_name, user_id);
            return Err(LedgerError::InvalidName(resource_name.to_owned()));
        }

        let mut entries = self.entries.lock().await;

        if let Some(existing) = entries.iter().find(|e| e.user_id == user_id) {
            return Err(LedgerError::AlreadyRegistered(Collision::User {
                resource_name: existing.resource_name.clone(),
            }));
        }
        if let Some(existing) = entries.iter().find(|e| e.claims(resource_name)) {
            return Err(LedgerError::AlreadyRegistered(Collision::Name {
                resource_name: existing.resource_name.clone(),
            }));
        }

        // Never go back in time, even if the wall clock does
        let now = Utc::now();
        let registered_at = entries
            .last()
            .map_or(now, |last| now.max(last.registered_at));

        let entry = RegistrationEntry {
            user_id: user_id.to_owned(),
            display_tag: display_tag.to_owned(),
            resource_name: resource_name.to_owned(),
            registered_at,
        };

        let mut users = entries.clone();
        users.push(entry.clone());
        let snapshot = Snapshot { users };
        self.store.save(&snapshot).await?;
        *entries = snapshot.users;

        info!("registered {} for {}", entry.resource_name, entry.user_id);

        Ok(entry)
    }

    /// Removes the entry owned by `user_id` and returns it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotRegistered`] if `user_id` has no entry
    /// - [`LedgerError::StorageUnavailable`] if the new snapshot cannot be saved; the
    ///   ledger is left unchanged
    pub async fn remove(&self, user_id: &str) -> Result<RegistrationEntry, LedgerError> {
        let mut entries = self.entries.lock().await;

        let Some(index) = entries.iter().position(|e| e.user_id == user_id) else {
            return Err(LedgerError::NotRegistered);
        };

        let mut users = entries.clone();
        let removed = users.remove(index);
        let snapshot = Snapshot { users };
        self.store.save(&snapshot).await?;
        *entries = snapshot.users;

        info!("removed {} for {}", removed.resource_name, removed.user_id);

        Ok(removed)
    }

    /// Returns a copy of all entries in insertion order.
    pub async fn list_all(&self) -> Vec<RegistrationEntry> {
        self.entries.lock().await.clone()
    }

    /// Number of registrations.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use futures::future::join_all;
    use tempfile::TempDir;

    use super::*;
    use crate::registrations::store::{JsonSnapshotStore, MockSnapshotStore};

    async fn create_test_ledger(temp_dir: &TempDir) -> Ledger<JsonSnapshotStore> {
        Ledger::load(JsonSnapshotStore::new(temp_dir.path().join("users.json")))
            .await
            .unwrap()
    }

    fn create_failing_store(snapshot: Snapshot) -> MockSnapshotStore {
        let mut store = MockSnapshotStore::new();
        store
            .expect_load()
            .times(1)
            .returning(move || Ok(snapshot.clone()));
        store.expect_save().returning(|_| {
            Err(LedgerError::StorageUnavailable(
                "disk is full".to_string(),
            ))
        });
        store
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;

        let entry = ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();

        assert_eq!(entry.user_id, "@steve:example.com");
        assert_eq!(entry.display_tag, "Steve");
        assert_eq!(entry.resource_name, "Steve123");
        assert_eq!(ledger.list_all().await, vec![entry]);
    }

    #[tokio::test]
    async fn test_list_all_is_a_copy() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();

        let listed = ledger.list_all().await;
        ledger
            .register("@alex:example.com", "Alex", "Alex")
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn test_register_persists_entry() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();

        // A fresh ledger on the same file sees the registration
        let reloaded = create_test_ledger(&temp_dir).await;
        let entries = reloaded.list_all().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource_name, "Steve123");
    }

    #[tokio::test]
    async fn test_register_invalid_name() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;

        let result = ledger.register("@steve:example.com", "Steve", "ab").await;

        assert!(matches!(result, Err(LedgerError::InvalidName(name)) if name == "ab"));
        assert!(ledger.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_name_taken_ignoring_case() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();

        let result = ledger
            .register("@alex:example.com", "Alex", "steve123")
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::AlreadyRegistered(Collision::Name { resource_name }))
            if resource_name == "Steve123"
        ));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_user_already_has_entry() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();

        let result = ledger
            .register("@steve:example.com", "Steve", "OtherName")
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::AlreadyRegistered(Collision::User { resource_name }))
            if resource_name == "Steve123"
        ));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_same_user_and_name_reports_user_collision() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();

        let result = ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::AlreadyRegistered(Collision::User { .. }))
        ));
    }

    #[tokio::test]
    async fn test_remove_returns_entry_then_not_registered() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        let registered = ledger
            .register("@alex:example.com", "Alex", "Alex")
            .await
            .unwrap();

        let removed = ledger.remove("@alex:example.com").await.unwrap();
        assert_eq!(removed, registered);

        let result = ledger.remove("@alex:example.com").await;
        assert!(matches!(result, Err(LedgerError::NotRegistered)));
    }

    #[tokio::test]
    async fn test_remove_only_touches_own_entry() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        ledger
            .register("@alex:example.com", "Alex", "Alex")
            .await
            .unwrap();
        let steve = ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();

        ledger.remove("@alex:example.com").await.unwrap();

        assert_eq!(ledger.list_all().await, vec![steve]);
        let reloaded = create_test_ledger(&temp_dir).await;
        assert_eq!(reloaded.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_then_remove_restores_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = create_test_ledger(&temp_dir).await;
        ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await
            .unwrap();
        let before = ledger.list_all().await;

        for name in ["abc", "Alex_2000", "a_b_c_d_e_f_g_h_", "UPPER"] {
            ledger
                .register("@alex:example.com", "Alex", name)
                .await
                .unwrap();
            ledger.remove("@alex:example.com").await.unwrap();

            assert_eq!(ledger.list_all().await, before);
        }
    }

    #[tokio::test]
    async fn test_registered_at_never_decreases() {
        let future = Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0).unwrap();
        let snapshot = Snapshot {
            users: vec![RegistrationEntry {
                user_id: "@old:example.com".to_string(),
                display_tag: "Old".to_string(),
                resource_name: "OldTimer".to_string(),
                registered_at: future,
            }],
        };
        let mut store = MockSnapshotStore::new();
        store
            .expect_load()
            .returning(move || Ok(snapshot.clone()));
        store.expect_save().returning(|_| Ok(()));
        let ledger = Ledger::load(store).await.unwrap();

        let entry = ledger
            .register("@new:example.com", "New", "Newcomer")
            .await
            .unwrap();

        assert!(entry.registered_at >= future);
        assert!(entry.registered_at < future + Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_register_storage_failure_leaves_ledger_unchanged() {
        let ledger = Ledger::load(create_failing_store(Snapshot::default()))
            .await
            .unwrap();

        let result = ledger
            .register("@steve:example.com", "Steve", "Steve123")
            .await;

        assert!(matches!(result, Err(LedgerError::StorageUnavailable(_))));
        assert!(ledger.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_storage_failure_leaves_ledger_unchanged() {
        let entry = RegistrationEntry {
            user_id: "@alex:example.com".to_string(),
            display_tag: "Alex".to_string(),
            resource_name: "Alex".to_string(),
            registered_at: Utc::now(),
        };
        let ledger = Ledger::load(create_failing_store(Snapshot {
            users: vec![entry.clone()],
        }))
        .await
        .unwrap();

        let result = ledger.remove("@alex:example.com").await;

        assert!(matches!(result, Err(LedgerError::StorageUnavailable(_))));
        assert_eq!(ledger.list_all().await, vec![entry]);
    }

    #[tokio::test]
    async fn test_load_propagates_corruption() {
        let mut store = MockSnapshotStore::new();
        store
            .expect_load()
            .returning(|| Err(LedgerError::StorageCorrupt("bad json".to_string())));

        let result = Ledger::load(store).await;

        assert!(matches!(result, Err(LedgerError::StorageCorrupt(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_same_name_different_case() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Arc::new(create_test_ledger(&temp_dir).await);

        let first = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.register("@a:example.com", "A", "Steve123").await }
        });
        let second = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.register("@b:example.com", "B", "STEVE123").await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(
                    r,
                    Err(LedgerError::AlreadyRegistered(Collision::Name { .. }))
                ))
                .count(),
            1
        );
        assert_eq!(ledger.len().await, 1);
        assert_eq!(create_test_ledger(&temp_dir).await.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_same_user() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Arc::new(create_test_ledger(&temp_dir).await);

        let first = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.register("@a:example.com", "A", "First").await }
        });
        let second = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.register("@a:example.com", "A", "Second").await }
        });
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(
                    r,
                    Err(LedgerError::AlreadyRegistered(Collision::User { .. }))
                ))
                .count(),
            1
        );
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_of_distinct_users_all_commit() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Arc::new(create_test_ledger(&temp_dir).await);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move {
                    ledger
                        .register(&format!("@user{}:example.com", i), "user", &format!("player{}", i))
                        .await
                })
            })
            .collect();
        for result in join_all(handles).await {
            result.unwrap().unwrap();
        }

        let entries = ledger.list_all().await;
        assert_eq!(entries.len(), 16);
        assert!(
            entries
                .windows(2)
                .all(|pair| pair[0].registered_at <= pair[1].registered_at)
        );
        assert_eq!(create_test_ledger(&temp_dir).await.list_all().await, entries);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_list_all_never_sees_entry_before_save_completes() {
        let existing = RegistrationEntry {
            user_id: "@steve:example.com".to_string(),
            display_tag: "Steve".to_string(),
            resource_name: "Steve123".to_string(),
            registered_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        };
        let snapshot = Snapshot {
            users: vec![existing.clone()],
        };
        let (save_started, save_started_rx) = std::sync::mpsc::channel();
        let mut store = MockSnapshotStore::new();
        store
            .expect_load()
            .times(1)
            .returning(move || Ok(snapshot.clone()));
        store
            .expect_save()
            .withf(|snapshot| snapshot.users.len() == 2)
            .times(1)
            .returning(move |_| {
                let _ = save_started.send(());
                std::thread::sleep(std::time::Duration::from_millis(500));
                Ok(())
            });
        let ledger = Arc::new(Ledger::load(store).await.unwrap());

        let registration = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.register("@alex:example.com", "Alex", "Alex").await }
        });
        tokio::task::spawn_blocking(move || save_started_rx.recv())
            .await
            .unwrap()
            .unwrap();

        // The save is in flight: either wait for it or see the old entries only
        match tokio::time::timeout(std::time::Duration::from_millis(100), ledger.list_all()).await
        {
            Err(_) => {}
            Ok(entries) => assert_eq!(entries, vec![existing.clone()]),
        }

        let added = registration.await.unwrap().unwrap();
        assert_eq!(ledger.list_all().await, vec![existing, added]);
    }
}
