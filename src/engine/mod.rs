//! UCI engine protocol handling: line parsing and per-process sessions.

pub mod info;
pub mod session;

pub use info::{parse_info, InfoLine, PvCollector};
pub use session::{EngineSession, SearchResult, SessionState};
