mod http_portal;
mod session_store;

pub use http_portal::HttpPortal;
pub use session_store::SessionStore;
