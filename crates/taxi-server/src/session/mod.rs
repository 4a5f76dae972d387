mod extract;
mod manager;

pub use extract::{CurrentDriver, SESSION_COOKIE};
pub use manager::{cleanup_task, Session, SessionManager};
