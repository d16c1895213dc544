use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const WINDOW: Duration = Duration::from_secs(60);

/// Per-route quotas within one window.
pub const FETCH_QUOTA: u32 = 30;
pub const PDF_QUOTA: u32 = 10;
pub const QUERY_QUOTA: u32 = 20;

struct Window {
    opened_at: Instant,
    hits: u32,
}

/// Fixed-window request counters keyed by (client address, route).
/// Purely in-process: restarting the server resets every counter, which
/// is acceptable for abuse mitigation and nothing stronger.
pub struct RateLimiter {
    window: Duration,
    counters: Mutex<HashMap<(IpAddr, &'static str), Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        RateLimiter {
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Counts this request against the client's window and reports
    /// whether it is inside the quota. The counter resets as soon as a
    /// full window has elapsed since it was opened.
    pub fn allow(&self, client: IpAddr, route: &'static str, quota: u32) -> bool {
        let mut counters = self.counters.lock().unwrap();
        let slot = counters.entry((client, route)).or_insert_with(|| Window {
            opened_at: Instant::now(),
            hits: 0,
        });

        if slot.opened_at.elapsed() >= self.window {
            slot.opened_at = Instant::now();
            slot.hits = 0;
        }

        slot.hits += 1;
        slot.hits <= quota
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::thread::sleep;

    fn client() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
    }

    #[test]
    fn quota_plus_one_is_rejected() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        for _ in 0..5 {
            assert!(limiter.allow(client(), "fetch", 5));
        }
        assert!(!limiter.allow(client(), "fetch", 5));
    }

    #[test]
    fn window_rollover_resets_the_counter() {
        let limiter = RateLimiter::new(Duration::from_millis(40));
        assert!(limiter.allow(client(), "pdf", 1));
        assert!(!limiter.allow(client(), "pdf", 1));

        sleep(Duration::from_millis(50));
        assert!(limiter.allow(client(), "pdf", 1));
    }

    #[test]
    fn clients_and_routes_are_independent(){
        let limiter = RateLimiter::new(Duration::from_secs(60));
        assert!(limiter.allow(client(), "fetch", 1));
        assert!(!limiter.allow(client(), "fetch", 1));

        // Different route, same client: separate counter.
        assert!(limiter.allow(client(), "query", 1));

        // Same route, different client: separate counter.
        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));
        assert!(limiter.allow(other, "fetch", 1));
    }
}
