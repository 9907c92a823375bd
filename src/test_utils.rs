use std::sync::{Mutex, MutexGuard, OnceLock};

// Process environment shared by every test thread (`DATA_DIR`, `GDGATE_*`).
fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Holds the env lock for its lifetime and puts every touched variable back
// the way it found it when dropped.
pub(crate) struct EnvScope {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvScope {
    pub(crate) fn new() -> Self {
        Self {
            _lock: env_lock(),
            saved: Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, key: &'static str, value: &str) -> &mut Self {
        self.remember(key);
        std::env::set_var(key, value);
        self
    }

    pub(crate) fn unset(&mut self, key: &'static str) -> &mut Self {
        self.remember(key);
        std::env::remove_var(key);
        self
    }

    fn remember(&mut self, key: &'static str) {
        if !self.saved.iter().any(|(saved, _)| *saved == key) {
            self.saved.push((key, std::env::var(key).ok()));
        }
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (key, original) in self.saved.drain(..).rev() {
            match original {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_restores_the_first_seen_value() {
        let key = "GDGATE_TEST_UTILS_SCOPE";
        {
            let mut env = EnvScope::new();
            env.set(key, "outer");
        }
        assert!(std::env::var(key).is_err());

        {
            let mut env = EnvScope::new();
            env.set(key, "one").set(key, "two");
            assert_eq!(std::env::var(key).as_deref(), Ok("two"));
            env.unset(key);
            assert!(std::env::var(key).is_err());
        }
        assert!(std::env::var(key).is_err());
    }
}
