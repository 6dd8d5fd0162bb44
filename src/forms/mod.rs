//! Create / edit forms with client-side validation. The backend stays
//! authoritative: a form that validates locally can still be rejected.

pub mod event;
pub mod user;

pub use event::{EventField, EventForm, EventInput};
pub use user::{UserField, UserForm, UserInput};

use crate::pages::Route;

/// Result of pressing "save".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; navigate to the route and reload its data.
    Saved(Route),
    /// Local validation failed; field errors are populated.
    Invalid,
    /// The backend rejected the request; the message is also kept as `submit_error`.
    Failed(String),
    /// A submission is already in flight.
    Busy,
}
