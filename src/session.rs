//! A session binds a directory URL to one transport, lazily building
//! the signed-request [`Connection`] once the directory's `newNonce`
//! URL is known.
use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::{Directory, DirectoryCache};
use crate::time::{ClockRef, RngRef, SystemClock, SystemRng};
use crate::transport::HttpTransport;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct Session {
    transport: Arc<dyn HttpTransport>,
    directory_cache: DirectoryCache,
    connection: OnceCell<Connection>,
    clock: ClockRef,
    rng: RngRef,
}

impl Session {
    pub fn new(directory_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let directory_url = directory_url.into();
        Self {
            directory_cache: DirectoryCache::new(directory_url, transport.clone()),
            transport,
            connection: OnceCell::new(),
            clock: Arc::new(SystemClock),
            rng: Arc::new(SystemRng),
        }
    }

    pub fn with_clock(mut self, clock: ClockRef) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: RngRef) -> Self {
        self.rng = rng;
        self
    }

    pub fn directory_url(&self) -> &str {
        self.directory_cache.url()
    }

    /// The directory, fetched once and refreshed according to its
    /// HTTP caching headers.
    pub async fn directory(&self) -> Result<Directory> {
        self.directory_cache.get(self.clock.now()).await
    }

    pub async fn invalidate_directory(&self) {
        self.directory_cache.invalidate().await;
    }

    /// The signed-request connection for this server, built on first
    /// use from the directory's `newNonce` URL.
    pub async fn connection(&self) -> Result<&Connection> {
        self.connection
            .get_or_try_init(|| async {
                let directory = self.directory().await?;
                Ok(Connection::new(self.transport.clone(), &directory.new_nonce))
            })
            .await
    }

    pub fn clock(&self) -> &ClockRef {
        &self.clock
    }

    pub fn rng(&self) -> &RngRef {
        &self.rng
    }
}
