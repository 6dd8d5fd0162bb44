pub mod api;
pub mod calendar;
pub mod dates;
pub mod public_gate;
pub mod session;
pub mod storage;

pub use api::ApiClient;
pub use calendar::{build_month_grid, CalendarCell, MonthCursor};
pub use public_gate::PublicGate;
pub use session::SessionStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
