use tracing::{error, warn};
use yew::Callback;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::session::Session;

/// What every page needs from the shell: settings, the logged-in user and
/// a way to end the session when the server rejects it.
#[derive(Clone, PartialEq)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: Session,
    pub on_unauthorized: Callback<()>,
}

impl AppContext {
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config, Some(&self.session))
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    /// Logs a failed operation and returns the message to show. A 401 ends the session.
    pub fn report(&self, action: &str, err: &ApiError) -> String {
        if err.is_unauthorized() {
            warn!(action, "server rejected the session");
            self.on_unauthorized.emit(());
        } else {
            error!(action, status = ?err.status_code(), %err, "operation failed");
        }
        err.to_string()
    }
}
