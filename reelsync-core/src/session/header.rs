use std::sync::Arc;

use reelsync_model::SessionState;

use crate::config::ClientConfig;
use crate::device::DeviceIdentity;

/// Renders the `X-Emby-Authorization` identification header.
///
/// Output is a pure function of the session snapshot and the client identity.
/// Field order is fixed: `Client`, `Device`, `DeviceId`, `Version`, and
/// `UserId` only when logged in.
#[derive(Clone, Debug)]
pub struct AuthHeaderBuilder {
    client_name: String,
    device_name: String,
    client_version: String,
    device: Arc<dyn DeviceIdentity>,
}

impl AuthHeaderBuilder {
    pub fn new(
        client_name: impl Into<String>,
        device_name: impl Into<String>,
        client_version: impl Into<String>,
        device: Arc<dyn DeviceIdentity>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            device_name: device_name.into(),
            client_version: client_version.into(),
            device,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        device: Arc<dyn DeviceIdentity>,
    ) -> Self {
        Self::new(
            &config.client_name,
            &config.device_name,
            &config.client_version,
            device,
        )
    }

    pub fn build_auth_header(&self, session: &SessionState) -> String {
        let mut header = format!(
            r#"MediaBrowser Client="{}", Device="{}", DeviceId="{}", Version="{}""#,
            quoted(&self.client_name),
            quoted(&self.device_name),
            quoted(&self.device.get_or_create()),
            quoted(&self.client_version),
        );
        if let Some(user_id) = session.user_id() {
            header.push_str(&format!(
                r#", UserId="{}""#,
                quoted(user_id.as_str())
            ));

        }
        header
    }
}

/// Values sit inside double quotes; a stray quote would end the field early.
fn quoted(value: &str) -> String {
    value.replace('"', "'")
}
