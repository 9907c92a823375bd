use crate::proxy::config::RateLimitConfig;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// Expired windows are swept once every this many checks.
const PRUNE_INTERVAL: u64 = 256;

// Pass/fail admission check consulted before a dispatch is attempted.
pub trait RateLimitGate: Send + Sync {
    fn check(&self, client_key: &str) -> bool;
}

// Fixed window per client key: at most `max_requests` hits per `window`.
pub struct FixedWindowGate {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, (u32, Instant)>,
    checks: AtomicU64,
}

impl FixedWindowGate {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_seconds),
            windows: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    pub fn remaining_wait(&self, client_key: &str) -> Duration {
        self.windows
            .get(client_key)
            .filter(|entry| entry.0 >= self.max_requests)
            .map(|entry| self.window.saturating_sub(entry.1.elapsed()))
            .unwrap_or_default()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    // Drops windows that have already expired.
    pub fn prune(&self) {
        let window = self.window;
        self.windows.retain(|_, (_, started)| started.elapsed() < window);
    }
}

impl RateLimitGate for FixedWindowGate {
    fn check(&self, client_key: &str) -> bool {
        if !self.enabled {
            return true;
        }

        // Must run before an entry guard is held; `retain` locks every shard.
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_INTERVAL == PRUNE_INTERVAL - 1 {
            self.prune();
        }

        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(client_key.to_string())
            .or_insert((0, now));

        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }

        if entry.0 >= self.max_requests {
            tracing::debug!(
                "Client {} rate limited ({} requests in current window)",
                client_key,
                entry.0
            );
            return false;
        }

        entry.0 += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(max_requests: u32, window_seconds: u64) -> FixedWindowGate {
        FixedWindowGate::new(&RateLimitConfig {
            enabled: true,
            max_requests,
            window_seconds,
        })
    }

    #[test]
    fn denies_after_limit_within_window() {
        let gate = gate(3, 300);
        assert!(gate.check("1.2.3.4"));
        assert!(gate.check("1.2.3.4"));
        assert!(gate.check("1.2.3.4"));
        assert!(!gate.check("1.2.3.4"));
        assert!(gate.remaining_wait("1.2.3.4") > Duration::from_secs(0));
        assert!(gate.check("5.6.7.8"));
    }

    #[test]
    fn window_resets_after_expiry() {
        let gate = gate(1, 0);
        assert!(gate.check("client"));
        assert!(gate.check("client"));
        gate.prune();
        assert_eq!(gate.remaining_wait("client"), Duration::from_secs(0));
    }

    #[test]
    fn expired_windows_are_swept_while_checking() {
        let gate = gate(1, 0);
        for i in 0..PRUNE_INTERVAL - 1 {
            assert!(gate.check(&format!("client-{}", i)));
        }
        assert_eq!(gate.tracked_clients() as u64, PRUNE_INTERVAL - 1);

        assert!(gate.check("last"));
        assert_eq!(gate.tracked_clients(), 1);
    }

    #[test]
    fn live_windows_survive_the_sweep() {
        let gate = gate(1, 300);
        for i in 0..PRUNE_INTERVAL {
            gate.check(&format!("client-{}", i));
        }
        assert_eq!(gate.tracked_clients() as u64, PRUNE_INTERVAL);
        assert!(!gate.check("client-0"));
    }

    #[test]
    fn disabled_gate_always_passes() {
        let gate = FixedWindowGate::new(&RateLimitConfig {
            enabled: false,
            max_requests: 0,
            window_seconds: 300,
        });
        for _ in 0..10 {
            assert!(gate.check("client"));
        }
    }
}
