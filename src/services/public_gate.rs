use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::pages::Route;
use crate::services::storage::{KeyValueStore, CALENDAR_UNLOCKED_KEY};

/// Password screen in front of the read-only public calendar.
///
/// The password is compared in plain text against the configured value. It
/// only keeps casual visitors out and is not an authentication mechanism.
pub struct PublicGate {
    password: String,
    storage: Arc<dyn KeyValueStore>,
}

impl PublicGate {
    pub fn new(password: impl Into<String>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            password: password.into(),
            storage,
        }
    }

    /// Check `attempt` and, on a match, set the unlock flag for the rest of
    /// the session. Errors carry the message to show under the input.
    pub fn unlock(&self, attempt: &str) -> AppResult<Route> {
        if attempt.trim().is_empty() {
            return Err(AppError::Validation(i18n::t("gate.password_required")));
        }

        if attempt != self.password {
            warn!("Public calendar unlock attempt with wrong password");
            return Err(AppError::Validation(i18n::t("gate.wrong_password")));
        }

        self.storage.set(CALENDAR_UNLOCKED_KEY, "true")?;
        info!("Public calendar unlocked");
        Ok(Route::PublicCalendar)
    }

    pub fn is_unlocked(&self) -> bool {
        match self.storage.get(CALENDAR_UNLOCKED_KEY) {
            Ok(flag) => flag.as_deref() == Some("true"),
            Err(e) => {
                warn!("Failed to read unlock flag: {}", e);
                false
            }
        }
    }

    pub fn lock(&self) -> AppResult<Route> {
        self.storage.remove(CALENDAR_UNLOCKED_KEY)?;
        Ok(Route::PublicGate)
    }
}
