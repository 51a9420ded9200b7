//! Redis cache provider.

use std::sync::Arc;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{Cmd, FromRedisValue, RedisError};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;

use crate::config::AppConfig;
use crate::container::BuildContext;
use crate::lifecycle::{BoxError, Hook};
use crate::observability::Logger;
use crate::resources::{is_unset, Resource};

/// Cache resource as seen by handlers.
pub type Cache = Resource<CachePool>;

/// Network and pool limits for the cache client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    pub pool_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            response_timeout: Duration::from_secs(2),
            pool_size: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis pool closed")]
    Closed,

    #[error("timed out waiting for a redis connection slot")]
    PoolTimeout,

    #[error("timed out connecting to redis")]
    ConnectTimeout,

    #[error("timed out waiting for redis response")]
    ResponseTimeout,

    #[error(transparent)]
    Redis(#[from] RedisError),
}

/// Bounded pool over one lazily dialed multiplexed connection.
///
/// The first checkout dials; later checkouts share that connection until it
/// drops or the pool is closed. At most `pool_size` checkouts are live.
#[derive(Clone)]
pub struct CachePool {
    client: redis::Client,
    permits: Arc<Semaphore>,
    shared: Arc<Mutex<Option<MultiplexedConnection>>>,
    settings: CacheSettings,
}

impl std::fmt::Debug for CachePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachePool")
            .field("settings", &self.settings)
            .field("available", &self.permits.available_permits())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl CachePool {
    /// Parse `url` without dialing.
    pub fn open(url: &str, settings: CacheSettings) -> Result<Self, RedisError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(settings.pool_size)),
            shared: Arc::new(Mutex::new(None)),
            settings,
        })
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Check out the shared connection, dialing within the connect timeout
    /// if there is none yet.
    pub async fn get(&self) -> Result<CacheConnection, CacheError> {
        let permit = timeout(self.settings.connect_timeout, self.permits.clone().acquire_owned())
            .await
            .map_err(|_| CacheError::PoolTimeout)?
            .map_err(|_| CacheError::Closed)?;

        let mut shared = self.shared.lock().await;
        let conn = match shared.as_ref() {
            Some(conn) => conn.clone(),
            None => {
                let conn = timeout(
                    self.settings.connect_timeout,
                    self.client.get_multiplexed_tokio_connection(),
                )
                .await
                .map_err(|_| CacheError::ConnectTimeout)??;
                *shared = Some(conn.clone());
                conn
            }
        };
        drop(shared);

        Ok(CacheConnection {
            conn,
            shared: self.shared.clone(),
            response_timeout: self.settings.response_timeout,
            _permit: permit,
        })
    }

    /// Refuse further checkouts and drop the shared connection.
    ///
    /// Outstanding checkouts keep their clone until they are dropped.
    pub async fn close(&self) {
        self.permits.close();
        self.shared.lock().await.take();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    /// Whether a dialed connection is currently held.
    pub async fn is_connected(&self) -> bool {
        self.shared.lock().await.is_some()
    }
}

/// A checked-out connection; its pool slot is returned on drop.
pub struct CacheConnection {
    conn: MultiplexedConnection,
    shared: Arc<Mutex<Option<MultiplexedConnection>>>,
    response_timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl CacheConnection {
    /// Run one command within the response timeout.
    ///
    /// A dropped connection is forgotten so the next checkout dials again.
    pub async fn query<T: FromRedisValue>(&mut self, cmd: &Cmd) -> Result<T, CacheError> {
        let result: redis::RedisResult<T> = timeout(self.response_timeout, cmd.query_async(&mut self.conn))
            .await
            .map_err(|_| CacheError::ResponseTimeout)?;

        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.is_connection_dropped() || err.is_io_error() {
                    self.shared.lock().await.take();
                }
                Err(err.into())
            }
        }
    }
}

/// Composition-root provider for [`Cache`].
pub async fn provide(
    (config, logger): (AppConfig, Logger),
    ctx: BuildContext,
) -> Result<Cache, BoxError> {
    if is_unset(&config.redis_url) {
        tracing::info!(parent: logger.span(), "redis disabled (redis_url not set)");
        return Ok(Resource::Disabled);
    }

    let pool = CachePool::open(&config.redis_url, CacheSettings::default())?;

    let release = pool.clone();
    ctx.lifecycle().append(Hook::new("redis").on_stop(move |_| async move {
        release.close().await;
        Ok(())
    }));

    tracing::info!(parent: logger.span(), pool_size = pool.settings().pool_size, "redis enabled");
    Ok(Resource::Enabled(pool))
}
