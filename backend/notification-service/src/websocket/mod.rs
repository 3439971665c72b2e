/// Real-time push channel for admin dashboards
///
/// 1. ConnectionManager: tracks open admin connections
/// 2. AdminSession: actor bridging one socket to the manager
/// 3. Broadcast: every fan-out push reaches all open sessions

pub mod manager;
pub mod messages;
pub mod session;

pub use manager::ConnectionManager;
pub use messages::WebSocketMessage;
pub use session::AdminSession;
