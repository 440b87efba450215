use std::sync::Arc;
use std::time::Duration;

use redkit_core::{
    ClientKind, ConnectionConfig, InvalidConfigSnafu, RedisClientBuilder, RedisSnafu, Result, With,
};
use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use snafu::{ResultExt, ensure};

use crate::handler::{IdleTracker, TracingErrorHandler, TracingEventHandler};
use crate::manager::RedisConnectionManager;
use crate::pool::RedisPool;

pub const DEFAULT_MAX_SIZE: u32 = 10;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// 连接池客户端 builder, 产出 [`RedisPool`]
///
/// ```no_run
/// use redkit_core::RedisClientBuilder;
/// use redkit_pool::PooledClientBuilder;
///
/// let pool = PooledClientBuilder::new().with_host("localhost").with_max_size(100).build().unwrap();
/// let mut conn = pool.get().unwrap();
/// let _: () = redis::cmd("PING").query(&mut *conn).unwrap();
/// ```
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, With)]
#[serde(default)]
pub struct PooledClientBuilder {
    #[serde(flatten)]
    #[with(skip)]
    pub connection: ConnectionConfig,

    /// 最大连接数
    pub max_size: u32,

    /// 最少保持的空闲连接数, 默认等于 `max_size`, 不会超过 `max_idle`
    pub min_idle: Option<u32>,

    /// 最多保持的空闲连接数, 超出的连接在归还时关闭
    pub max_idle: Option<u32>,

    /// 借出前 PING
    pub test_on_check_out: bool,

    /// 归还时 PING, 失败的连接被丢弃
    pub test_on_check_in: bool,

    /// 空闲超过该时长的连接由后台回收
    #[serde(rename = "idle_timeout_ms")]
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub idle_timeout: Option<Duration>,

    /// 连接最长存活时间
    #[serde(rename = "max_lifetime_ms")]
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    pub max_lifetime: Option<Duration>,

    /// 借出连接的最长等待时间
    #[serde(rename = "checkout_timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub checkout_timeout: Duration,

    /// 池满时是否等待, `false` 时立即失败
    pub block_when_exhausted: bool,

    /// 是否以 tracing 输出连接池事件
    pub event_logging: bool,

    /// 每个新连接执行 `CLIENT SETNAME`
    #[with(into)]
    pub client_name: Option<String>,
}

impl Default for PooledClientBuilder {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            max_size: DEFAULT_MAX_SIZE,
            min_idle: None,
            max_idle: None,
            test_on_check_out: true,
            test_on_check_in: false,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            max_lifetime: Some(DEFAULT_MAX_LIFETIME),
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
            block_when_exhausted: true,
            event_logging: true,
            client_name: None,
        }
    }
}

impl PooledClientBuilder {
    pub fn new() -> Self { Self::default() }

    /// 实际生效的 `min_idle`
    pub fn effective_min_idle(&self) -> Option<u32> {
        match (self.min_idle, self.max_idle) {
            (Some(min), Some(max)) => Some(min.min(max)),
            (None, Some(max)) if max < self.max_size => Some(max),
            (min, _) => min,
        }
    }

    /// 提前拒绝 r2d2 会 panic 的配置
    fn validate(&self) -> Result<()> {
        ensure!(self.max_size > 0, InvalidConfigSnafu { message: "max_size must be positive" });
        ensure!(
            self.min_idle.is_none_or(|min| min <= self.max_size),
            InvalidConfigSnafu { message: format!("min_idle must be no larger than max_size {}", self.max_size) }
        );
        ensure!(!self.checkout_timeout.is_zero(), InvalidConfigSnafu { message: "checkout_timeout must be positive" });
        ensure!(
            !self.idle_timeout.is_some_and(|d| d.is_zero()),
            InvalidConfigSnafu { message: "idle_timeout must be positive" }
        );
        ensure!(
            !self.max_lifetime.is_some_and(|d| d.is_zero()),
            InvalidConfigSnafu { message: "max_lifetime must be positive" }
        );
        Ok(())
    }
}

impl RedisClientBuilder for PooledClientBuilder {
    type Client = RedisPool;

    fn kind(&self) -> ClientKind { ClientKind::Pooled }

    fn connection(&self) -> &ConnectionConfig { &self.connection }

    fn connection_mut(&mut self) -> &mut ConnectionConfig { &mut self.connection }

    fn build(&self) -> Result<RedisPool> {
        self.validate()?;

        let client = redis::Client::open(self.connection.connection_info()).context(RedisSnafu)?;
        let tracker = Arc::new(IdleTracker::new(self.max_idle));
        let manager = RedisConnectionManager::new(client.clone())
            .with_connection_timeout(self.connection.connection_timeout)
            .with_socket_timeout(self.connection.socket_timeout)
            .with_client_name(self.client_name.clone())
            .with_test_on_check_in(self.test_on_check_in)
            .with_tracker(tracker.clone());

        let pool = r2d2::Pool::builder()
            .max_size(self.max_size)
            .min_idle(self.effective_min_idle())
            .test_on_check_out(self.test_on_check_out)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connection_timeout(self.checkout_timeout)
            .error_handler(Box::new(TracingErrorHandler))
            .event_handler(Box::new(TracingEventHandler::new(tracker, self.event_logging)))
            .build_unchecked(manager);

        tracing::debug!(
            address = %self.connection.address(),
            database = self.connection.database,
            ssl = self.connection.ssl,
            max_size = self.max_size,
            min_idle = ?self.effective_min_idle(),
            max_idle = ?self.max_idle,
            "redis pool built"
        );
        Ok(RedisPool::new(pool, client, self.max_idle, self.test_on_check_in, self.block_when_exhausted))
    }
}
