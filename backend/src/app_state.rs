use std::sync::Arc;

use crate::config::Config;
use crate::platform::DataPlatform;

/// Shared by every worker of the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Platform acting with the public key. Requests scope it to the caller's
    /// token before touching any table.
    pub platform: Arc<dyn DataPlatform>,
    /// Platform used by `exportar-dados`, which has no user session.
    pub service_platform: Arc<dyn DataPlatform>,
    pub config: Arc<Config>,
}
