//! Wire types exchanged with the REST backend, one file per entity.
//! Re-exported at `crate::models` so callers can `use crate::models::*;`.

pub mod calendar;
pub mod event;
pub mod user;

pub use self::calendar::*;
pub use self::event::*;
pub use self::user::*;
