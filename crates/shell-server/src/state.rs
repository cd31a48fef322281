use shell_core::config::AppConfig;
use shell_pty::{NativePtySpawner, TerminalSpawner};
use std::sync::Arc;

use crate::controller::{ShellContext, ShellSettings};
use crate::tunnel::{AdbTunnel, DeviceTunnel};

/// Shared application state for the server.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub shell: Arc<ShellContext>,
}

impl AppState {
    /// State backed by adb and the native pty system.
    pub fn new(config: AppConfig) -> Self {
        let settings = ShellSettings::from_config(&config.shell);
        let tunnel = Arc::new(AdbTunnel::new(settings.adb.clone()));
        Self::with_collaborators(config, tunnel, Arc::new(NativePtySpawner))
    }

    pub fn with_collaborators(
        config: AppConfig,
        tunnel: Arc<dyn DeviceTunnel>,
        spawner: Arc<dyn TerminalSpawner>,
    ) -> Self {
        let settings = ShellSettings::from_config(&config.shell);
        Self {
            config,
            shell: Arc::new(ShellContext {
                settings,
                tunnel,
                spawner,
            }),
        }
    }
}
