use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use taxi_core::Driver;

/// A logged-in driver's session.
pub struct Session {
    pub id: String,
    pub driver_id: u64,
    last_activity: AtomicU64,
    visits: AtomicU64,
}

impl Session {
    fn new(id: String, driver_id: u64) -> Self {
        Self {
            id,
            driver_id,
            last_activity: AtomicU64::new(Self::now_timestamp()),
            visits: AtomicU64::new(0),
        }
    }

    fn now_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    pub fn touch(&self) {
        self.last_activity.store(Self::now_timestamp(), Ordering::SeqCst);
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        let last = self.last_activity.load(Ordering::SeqCst);
        let now = Self::now_timestamp();
        now.saturating_sub(last) > timeout.as_secs()
    }

    /// Count a visit to the index page, returning the new total.
    pub fn record_visit(&self) -> u64 {
        self.visits.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn visits(&self) -> u64 {
        self.visits.load(Ordering::SeqCst)
    }
}

/// Manages all active sessions
pub struct SessionManager {
    sessions: DashMap<String, Arc<Session>>,
    timeout: Duration,
}

impl SessionManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    /// Start a session for a driver who just logged in.
    pub fn create_session(&self, driver: &Driver) -> Arc<Session> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(session_id.clone(), driver.id));
        self.sessions.insert(session_id, session.clone());

        tracing::debug!(driver_id = driver.id, "session created");
        session
    }

    /// Get a live session by ID, updating its last activity time.
    ///
    /// An expired session is dropped on access rather than waiting for the
    /// sweeper.
    pub fn get_session(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| entry.clone())?;
        if session.is_expired(self.timeout) {
            self.sessions.remove(id);
            return None;
        }
        session.touch();
        Some(session)
    }

    pub fn delete_session(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop every session belonging to a driver.
    pub fn delete_driver_sessions(&self, driver_id: u64) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.driver_id != driver_id);
        before.saturating_sub(self.sessions.len())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Clean up expired sessions
    pub fn cleanup_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(self.timeout));
        before.saturating_sub(self.sessions.len())
    }
}

/// Background task to periodically clean up expired sessions
pub async fn cleanup_task(manager: Arc<SessionManager>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let cleaned = manager.cleanup_expired();
        if cleaned > 0 {
            tracing::info!("Cleaned up {} expired sessions", cleaned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(id: u64) -> Driver {
        Driver {
            id,
            username: format!("driver{id}"),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            license_number: None,
            is_staff: false,
        }
    }

    #[test]
    fn test_create_get_delete() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let session = manager.create_session(&driver(1));

        let found = manager.get_session(&session.id).unwrap();
        assert_eq!(found.driver_id, 1);
        assert_eq!(manager.session_count(), 1);

        assert!(manager.delete_session(&session.id));
        assert!(!manager.delete_session(&session.id));
        assert!(manager.get_session(&session.id).is_none());
    }

    #[test]
    fn test_visits_are_per_session() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let a = manager.create_session(&driver(1));
        let b = manager.create_session(&driver(1));

        assert_eq!(a.record_visit(), 1);
        assert_eq!(a.record_visit(), 2);
        assert_eq!(b.record_visit(), 1);
        assert_eq!(a.visits(), 2);
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let session = manager.create_session(&driver(1));
        session
            .last_activity
            .store(Session::now_timestamp() - 120, Ordering::SeqCst);

        assert_eq!(manager.cleanup_expired(), 1);
        assert_eq!(manager.session_count(), 0);

        let session = manager.create_session(&driver(2));
        session
            .last_activity
            .store(Session::now_timestamp() - 120, Ordering::SeqCst);
        assert!(manager.get_session(&session.id).is_none());
        assert_eq!(manager.session_count(), 0);
    }

    #[test]
    fn test_delete_driver_sessions() {
        let manager = SessionManager::new(Duration::from_secs(60));
        manager.create_session(&driver(1));
        manager.create_session(&driver(1));
        let keep = manager.create_session(&driver(2));

        assert_eq!(manager.delete_driver_sessions(1), 2);
        assert!(manager.get_session(&keep.id).is_some());
    }
}
