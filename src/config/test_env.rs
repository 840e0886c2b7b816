use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Process env edits for one test, undone on drop.
///
/// Holds the env lock for its whole lifetime, so tests that touch `HITL_*`
/// variables never interleave.
pub(super) struct ScopedEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    pub(super) fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn remember(&mut self, key: &'static str) {
        if self.saved.iter().all(|(saved, _)| *saved != key) {
            self.saved.push((key, std::env::var(key).ok()));
        }
    }

    pub(super) fn set(mut self, key: &'static str, value: &str) -> Self {
        self.remember(key);
        // SAFETY: ENV_LOCK is held until this value drops.
        unsafe { std::env::set_var(key, value) };
        self
    }

    pub(super) fn unset(mut self, key: &'static str) -> Self {
        self.remember(key);
        // SAFETY: ENV_LOCK is held until this value drops.
        unsafe { std::env::remove_var(key) };
        self
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            // SAFETY: the lock field is dropped after this body runs.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}

#[test]
fn scoped_env_restores_previous_values() {
    const KEY: &str = "HITL_TEST_ENV_SCOPE";
    {
        let _env = ScopedEnv::new().set(KEY, "first").set(KEY, "second");
        assert_eq!(std::env::var(KEY).as_deref(), Ok("second"));
    }
    assert!(std::env::var(KEY).is_err());
}
