//! Per-session sliding-window admission control.
//!
//! State is process-local and resets on restart. The session map is bounded:
//! when it reaches capacity, the least-recently-seen session window is
//! evicted to make room, so the set of all session ids ever seen cannot grow
//! without bound.

use consilium_config::RateLimitConfig;
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Admission window state for a single session.
struct SessionWindow {
    /// Timestamps of admitted requests, oldest first.
    admitted: VecDeque<Instant>,
    /// Last admission attempt, admitted or not; drives eviction.
    last_seen: Instant,
}

/// Sliding-window rate limiter keyed by session id.
///
/// Lock order is always map then window, so admissions for different
/// sessions only contend on the brief map lookup while same-session
/// admissions are fully serialized through the window mutex.
pub struct SessionRateLimiter {
    max_requests: usize,
    window: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionWindow>>>>,
}

impl SessionRateLimiter {
    /// Create a limiter from the configured ceiling and window.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            max_sessions: config.max_sessions,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Admit or reject a request for the session at the current time.
    pub fn admit(&self, session_id: &str) -> bool {
        self.admit_at(session_id, Instant::now())
    }

    fn admit_at(&self, session_id: &str, now: Instant) -> bool {
        let window = self.session_window(session_id, now);
        let mut window = window.lock();
        window.last_seen = now;
        while let Some(oldest) = window.admitted.front() {
            if now.duration_since(*oldest) >= self.window {
                window.admitted.pop_front();
            } else {
                break;
            }
        }
        if window.admitted.len() >= self.max_requests {
            debug!(
                "rejecting request over session ceiling (session_id={}, in_window={})",
                session_id,
                window.admitted.len()
            );
            return false;
        }
        window.admitted.push_back(now);
        true
    }

    /// Fetch or create the window for a session, evicting if at capacity.
    fn session_window(&self, session_id: &str, now: Instant) -> Arc<Mutex<SessionWindow>> {
        if let Some(window) = self.sessions.read().get(session_id) {
            return window.clone();
        }

        let mut sessions = self.sessions.write();
        if let Some(window) = sessions.get(session_id) {
            return window.clone();
        }
        if sessions.len() >= self.max_sessions {
            evict_least_recent(&mut sessions);
        }
        let window = Arc::new(Mutex::new(SessionWindow {
            admitted: VecDeque::new(),
            last_seen: now,
        }));
        sessions.insert(session_id.to_string(), window.clone());
        window
    }

    /// Number of sessions currently tracked.
    pub fn tracked_sessions(&self) -> usize {
        self.sessions.read().len()
    }
}

/// Remove the session whose window was touched least recently.
fn evict_least_recent(sessions: &mut HashMap<String, Arc<Mutex<SessionWindow>>>) {
    let stalest = sessions
        .iter()
        .min_by_key(|(_, window)| window.lock().last_seen)
        .map(|(session_id, _)| session_id.clone());
    if let Some(session_id) = stalest {
        warn!(
            "evicting rate-limit window at session capacity (session_id={})",
            session_id
        );
        sessions.remove(&session_id);
    }
}
