use crate::providers::Provider;
use crate::settings::Settings;

/// Process-wide server state: the settings snapshot and the injected
/// provider client, constructed once at startup and cloned per call.
pub(crate) struct ServerState<P: Provider> {
    pub(crate) settings: Settings,
    pub(crate) provider: P,
}
