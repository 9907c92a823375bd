use dashmap::DashMap;
use std::time::{Duration, Instant};

// Remembers when each upstream last answered, so a failure can be reported
// together with a "last worked X ago" hint.
pub trait SuccessTracker: Send + Sync {
    fn record_success(&self, server_id: &str);
    fn time_since_last_success(&self, server_id: &str) -> Option<Duration>;
}

#[derive(Debug, Default)]
pub struct InMemorySuccessTracker {
    last_success: DashMap<String, Instant>,
}

impl InMemorySuccessTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuccessTracker for InMemorySuccessTracker {
    fn record_success(&self, server_id: &str) {
        self.last_success.insert(server_id.to_string(), Instant::now());
    }

    fn time_since_last_success(&self, server_id: &str) -> Option<Duration> {
        self.last_success
            .get(server_id)
            .map(|at| Instant::now().saturating_duration_since(*at))
    }
}

fn plural(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}

pub fn humanize_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    match secs {
        0..=59 => plural(secs, "second"),
        60..=3599 => plural(secs / 60, "minute"),
        3600..=86_399 => plural(secs / 3600, "hour"),
        _ => plural(secs / 86_400, "day"),
    }
}

pub fn last_worked_hint(elapsed: Option<Duration>) -> String {
    match elapsed {
        Some(d) => format!("last worked {} ago", humanize_elapsed(d)),
        None => "has not worked since the gateway started".to_string(),
    }
}
