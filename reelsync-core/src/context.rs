use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::device::{DeviceIdentity, FileDeviceIdentity};
use crate::error::{CatalogError, Result};
use crate::remote::{HttpClient, JellyfinClient, RemoteCatalogSource};
use crate::repository::CatalogRepository;
use crate::session::{
    AuthHeaderBuilder, AuthenticationService, RequestAuthenticator,
    SessionStore,
};
use crate::store::LocalCatalogStore;

/// Builds every component once and hands out shared handles.
#[derive(Clone, Debug)]
pub struct CatalogContext {
    pub config: ClientConfig,
    pub session: SessionStore,
    pub authenticator: RequestAuthenticator,
    pub auth: AuthenticationService,
    pub store: LocalCatalogStore,
    pub repository: CatalogRepository,
}

impl CatalogContext {
    /// Opens the on-disk store named by the config and wires the Jellyfin
    /// client against it.
    ///
    /// The device id is loaded here, off the runtime threads, so
    /// authenticating a request never touches the disk.
    pub async fn open(config: ClientConfig) -> Result<Self> {
        let store = LocalCatalogStore::open(&config.database_path).await?;
        let device = Arc::new(FileDeviceIdentity::in_dir(&config.data_dir()));

        let warm = Arc::clone(&device);
        let device_id =
            tokio::task::spawn_blocking(move || warm.get_or_create())
                .await
                .map_err(|err| {
                    CatalogError::unknown(format!(
                        "Device id task failed: {err}"
                    ))
                })?;
        debug!(%device_id, "Device identity ready");

        Self::assemble(config, store, device, None)
    }


    /// Same wiring with caller-supplied parts; `remote` replaces the
    /// Jellyfin client when given.
    pub fn assemble(
        config: ClientConfig,
        store: LocalCatalogStore,
        device: Arc<dyn DeviceIdentity>,
        remote: Option<Arc<dyn RemoteCatalogSource>>,
    ) -> Result<Self> {
        let session = SessionStore::new();
        let headers = AuthHeaderBuilder::from_config(&config, device);
        let authenticator = RequestAuthenticator::new(session.clone(), headers);
        let http = HttpClient::new(&config, authenticator.clone())?;

        let auth = AuthenticationService::new(http.clone(), session.clone());
        let remote =
            remote.unwrap_or_else(|| Arc::new(JellyfinClient::new(http)));
        let repository = CatalogRepository::new(remote, store.clone());

        info!(
            client = %config.client_name,
            version = %config.client_version,
            "Catalog context ready"
        );
        Ok(Self {
            config,
            session,
            authenticator,
            auth,
            store,
            repository,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::authenticator::AUTHORIZATION_HEADER;
    use reqwest::{Method, Request};
    use url::Url;

    #[tokio::test]
    async fn device_id_is_loaded_before_any_request() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = ClientConfig {
            database_path: dir.path().join("catalog.db"),
            ..ClientConfig::default()
        };

        let ctx = CatalogContext::open(config).await.expect("open context");
        let id_file = dir.path().join("device_id");
        let device_id =
            std::fs::read_to_string(&id_file).expect("id persisted");

        // Headers come from memory from here on
        std::fs::remove_file(&id_file).expect("remove id file");
        let mut request = Request::new(
            Method::GET,
            Url::parse("http://localhost:8096/System/Info").expect("url"),
        );
        ctx.authenticator.authenticate(&mut request);

        let header = request.headers()[AUTHORIZATION_HEADER]
            .to_str()
            .expect("ascii");
        let expected = format!(r#"DeviceId="{}""#, device_id.trim());
        assert!(header.contains(&expected));

        assert!(!id_file.exists());
        ctx.store.close().await;
    }
}
