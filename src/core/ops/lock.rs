//! core::ops::lock
//!
//! Per-repository lock registry.
//!
//! # Architecture
//!
//! A [`LockRegistry`] maps each normalized repository path to a gate. Every
//! operation against a working copy, reads included, first calls
//! [`LockRegistry::acquire`] and holds the returned [`RepoGuard`] until it
//! returns. Callers for the same path queue up; callers for different paths
//! never touch each other's gate.
//!
//! The registry is a plain value. The engine owns one (usually behind an
//! `Arc`) and tests can build as many as they like.
//!
//! # Invariants
//!
//! - At most one live guard per normalized path
//! - A guard releases on drop, including during a panic unwind
//! - Gates are created on first use and never removed
//! - Acquisition blocks, it never fails
//! - An operation holds at most one repository's guard
//!
//! # Example
//!
//! ```
//! use gitlane::core::ops::lock::LockRegistry;
//! use std::path::Path;
//!
//! let registry = LockRegistry::new();
//! {
//!     let guard = registry.acquire(Path::new("/tmp/some-repo"));
//!     assert!(registry.is_locked(guard.path()));
//! }
//! assert!(!registry.is_locked(Path::new("/tmp/some-repo")));
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Lock state for one repository path.
#[derive(Debug, Default)]
struct Gate {
    held: Mutex<bool>,
    released: Condvar,
}

impl Gate {
    fn state(&self) -> MutexGuard<'_, bool> {
        // The bool stays consistent even if a holder panicked.
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-side registry of repository locks.
#[derive(Debug, Default)]
pub struct LockRegistry {
    gates: Mutex<HashMap<PathBuf, Arc<Gate>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn gate(&self, key: &Path) -> Arc<Gate> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(key.to_path_buf()).or_default())
    }

    /// Block until the lock for `path` is free, then take it.
    pub fn acquire(&self, path: &Path) -> RepoGuard {
        let key = normalize(path);
        let gate = self.gate(&key);

        {
            let mut held = gate.state();
            if *held {
                tracing::trace!(path = %key.display(), "waiting for repository lock");
            }
            while *held {
                held = gate
                    .released
                    .wait(held)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            *held = true;
        }

        tracing::trace!(path = %key.display(), "repository lock acquired");
        RepoGuard { path: key, gate }
    }

    /// Take the lock only if nobody holds it.
    pub fn try_acquire(&self, path: &Path) -> Option<RepoGuard> {
        let key = normalize(path);
        let gate = self.gate(&key);

        {
            let mut held = gate.state();
            if *held {
                return None;
            }
            *held = true;
        }

        Some(RepoGuard { path: key, gate })
    }

    /// Whether some guard currently holds `path`.
    pub fn is_locked(&self, path: &Path) -> bool {
        let key = normalize(path);
        let gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.get(&key).is_some_and(|gate| *gate.state())
    }

    /// Number of distinct repository paths seen so far.
    pub fn len(&self) -> usize {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held lock on one repository path; released on drop.
#[derive(Debug)]
#[must_use = "the repository lock is released as soon as the guard is dropped"]
pub struct RepoGuard {
    path: PathBuf,
    gate: Arc<Gate>,
}

impl RepoGuard {
    /// Normalized path this guard protects.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoGuard {
    fn drop(&mut self) {
        *self.gate.state() = false;
        self.gate.released.notify_one();
        tracing::trace!(path = %self.path.display(), "repository lock released");
    }
}

/// Canonical form of a repository path.
///
/// Existing paths are canonicalized (symlinks resolved). Paths that do not
/// exist yet are cleaned lexically so `a/./b` and `a/b` share a lock.
pub fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn acquire_and_release() {
        let temp = TempDir::new().expect("create temp dir");
        let registry = LockRegistry::new();

        let guard = registry.acquire(temp.path());
        assert!(registry.is_locked(temp.path()));
        drop(guard);
        assert!(!registry.is_locked(temp.path()));
    }

    #[test]
    fn try_acquire_returns_none_when_locked() {
        let temp = TempDir::new().expect("create temp dir");
        let registry = LockRegistry::new();

        let _guard = registry.acquire(temp.path());
        assert!(registry.try_acquire(temp.path()).is_none());
    }

    #[test]
    fn try_acquire_returns_guard_when_free() {
        let temp = TempDir::new().expect("create temp dir");
        let registry = LockRegistry::new();

        let guard = registry.try_acquire(temp.path()).expect("should get lock");
        assert_eq!(guard.path(), normalize(temp.path()));
    }

    #[test]
    fn equivalent_paths_share_a_gate() {
        let temp = TempDir::new().expect("create temp dir");
        fs::create_dir(temp.path().join("repo")).expect("mkdir");
        let registry = LockRegistry::new();

        let _guard = registry.acquire(&temp.path().join("repo"));
        let dotted = temp.path().join(".").join("repo").join("..").join("repo");
        assert!(registry.try_acquire(&dotted).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_paths_normalize_lexically() {
        assert_eq!(
            normalize(Path::new("/no/such/./dir/../repo")),
            PathBuf::from("/no/such/repo")
        );
    }

    #[test]
    fn different_paths_are_independent() {
        let a = TempDir::new().expect("create temp dir");
        let b = TempDir::new().expect("create temp dir");
        let registry = LockRegistry::new();

        let _ga = registry.acquire(a.path());
        let gb = registry.try_acquire(b.path());
        assert!(gb.is_some());
    }

    #[test]
    fn released_after_panic() {
        let temp = TempDir::new().expect("create temp dir");
        let registry = Arc::new(LockRegistry::new());
        let path = temp.path().to_path_buf();

        let r = Arc::clone(&registry);
        let p = path.clone();
        let result = thread::spawn(move || {
            let _guard = r.acquire(&p);
            panic!("operation failed while holding the lock");
        })
        .join();

        assert!(result.is_err());
        assert!(!registry.is_locked(&path));
        let _again = registry.acquire(&path);
    }

    #[test]
    fn serializes_same_path() {
        let temp = TempDir::new().expect("create temp dir");
        let registry = Arc::new(LockRegistry::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let inside = Arc::clone(&inside);
                let peak = Arc::clone(&peak);
                let barrier = Arc::clone(&barrier);
                let path = temp.path().to_path_buf();
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..20 {
                        let _guard = registry.acquire(&path);
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_paths_overlap() {
        let a = TempDir::new().expect("create temp dir");
        let b = TempDir::new().expect("create temp dir");
        let registry = Arc::new(LockRegistry::new());
        let both_inside = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [a.path().to_path_buf(), b.path().to_path_buf()]
            .into_iter()
            .map(|path| {
                let registry = Arc::clone(&registry);
                let both_inside = Arc::clone(&both_inside);
                thread::spawn(move || {
                    let _guard = registry.acquire(&path);
                    // Deadlocks unless both guards are held at once.
                    both_inside.wait();
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert_eq!(registry.len(), 2);
    }
}
