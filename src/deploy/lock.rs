// ABOUTME: In-process deploy locks keyed by project and commit.
// ABOUTME: Runs for the same key queue behind each other; different keys never wait.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::{CommitHash, ProjectRef};

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// `project@commit` being deployed.
    pub key: String,
}

impl LockInfo {
    fn new(key: &str) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            key: key.to_string(),
        }
    }
}

#[derive(Default)]
struct Slot {
    gate: Arc<Mutex<()>>,
    holder: parking_lot::Mutex<Option<LockInfo>>,
}

type Slots = Arc<parking_lot::Mutex<HashMap<String, Arc<Slot>>>>;

/// Registry of per-key locks.
#[derive(Default)]
pub struct DeployLocks {
    slots: Slots,
}

impl DeployLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(project: &ProjectRef, commit: &CommitHash) -> String {
        format!("{}@{}", project, commit)
    }

    /// Wait until no other run holds the key, then hold it until the
    /// returned guard drops.
    pub async fn acquire(&self, project: &ProjectRef, commit: &CommitHash) -> DeployLock {
        let key = Self::key(project, commit);
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let guard = match Arc::clone(&slot.gate).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                if let Some(info) = slot.holder.lock().clone() {
                    tracing::info!(
                        key = %key,
                        holder = %info.holder,
                        pid = info.pid,
                        since = %info.started_at,
                        "waiting for running deployment"
                    );
                }
                Arc::clone(&slot.gate).lock_owned().await
            }
        };
        let info = LockInfo::new(&key);
        *slot.holder.lock() = Some(info.clone());

        DeployLock {
            slots: Arc::clone(&self.slots),
            key,
            info,
            slot: Some((slot, guard)),
        }
    }

    /// Holder of the key, if a run currently holds it.
    pub fn holder(&self, project: &ProjectRef, commit: &CommitHash) -> Option<LockInfo> {
        let slots = self.slots.lock();
        slots
            .get(&Self::key(project, commit))
            .and_then(|slot| slot.holder.lock().clone())
    }
}

/// A held deploy lock that releases on drop.
pub struct DeployLock {
    slots: Slots,
    key: String,
    info: LockInfo,
    slot: Option<(Arc<Slot>, OwnedMutexGuard<()>)>,
}

impl DeployLock {
    pub fn info(&self) -> &LockInfo {
        &self.info
    }
}

impl std::fmt::Debug for DeployLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployLock").field("key", &self.key).finish()
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        let mut slots = self.slots.lock();
        if let Some((slot, guard)) = self.slot.take() {
            *slot.holder.lock() = None;
            drop(guard);
        }
        // Only the map still references the slot: nobody is waiting.
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key() -> (ProjectRef, CommitHash) {
        (
            ProjectRef::new("github.com/acme/app").unwrap(),
            CommitHash::new("deadbeef").unwrap(),
        )
    }

    #[tokio::test]
    async fn second_acquire_waits_for_release() {
        let locks = Arc::new(DeployLocks::new());
        let (project, commit) = key();

        let first = locks.acquire(&project, &commit).await;
        let holder = locks.holder(&project, &commit).unwrap();
        assert_eq!(holder.pid, std::process::id());
        assert_eq!(first.info().key, "github.com/acme/app@deadbeef");

        let waiter = {
            let locks = Arc::clone(&locks);
            let (project, commit) = (project.clone(), commit.clone());
            tokio::spawn(async move {
                let _lock = locks.acquire(&project, &commit).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.holder(&project, &commit).is_none());
    }

    #[tokio::test]
    async fn different_commits_do_not_block() {
        let locks = DeployLocks::new();
        let project = ProjectRef::new("github.com/acme/app").unwrap();
        let a = CommitHash::new("aaaa1111").unwrap();
        let b = CommitHash::new("bbbb2222").unwrap();

        let _first = locks.acquire(&project, &a).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&project, &b)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn released_keys_are_forgotten() {
        let locks = DeployLocks::new();
        let (project, commit) = key();
        drop(locks.acquire(&project, &commit).await);
        assert!(locks.slots.lock().is_empty());
    }
}
