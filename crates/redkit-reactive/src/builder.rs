use redkit_core::{ClientKind, ConnectionConfig, InvalidConfigSnafu, RedisClientBuilder, RedisSnafu, Result, With};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, ensure};

use crate::behavior::DisconnectedBehavior;
use crate::client::{ReactiveClient, ReactiveOptions};

/// 异步客户端 builder, 产出 [`ReactiveClient`]
///
/// `socket_timeout` 映射为响应超时.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, With)]
#[serde(default)]
pub struct ReactiveClientBuilder {
    #[serde(flatten)]
    #[with(skip)]
    pub connection: ConnectionConfig,

    /// ACL 用户名
    #[with(into)]
    pub user: Option<String>,

    /// 断线后自动重连
    pub auto_reconnect: bool,

    /// 单连接上未完成请求的上限
    pub request_queue_size: usize,

    /// 每条命令在新的 tokio 任务上执行
    pub publish_on_scheduler: bool,

    pub disconnected_behavior: DisconnectedBehavior,

    /// 每次重连的最大尝试次数
    pub reconnect_retries: Option<usize>,
}

impl Default for ReactiveClientBuilder {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            user: None,
            auto_reconnect: true,
            request_queue_size: usize::MAX,
            publish_on_scheduler: false,
            disconnected_behavior: DisconnectedBehavior::Default,
            reconnect_retries: None,
        }
    }
}

impl ReactiveClientBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn options(&self) -> ReactiveOptions {
        ReactiveOptions {
            auto_reconnect: self.auto_reconnect,
            request_queue_size: self.request_queue_size,
            publish_on_scheduler: self.publish_on_scheduler,
            disconnected_behavior: self.disconnected_behavior,
            reconnect_retries: self.reconnect_retries,
            connection_timeout: self.connection.connection_timeout,
            response_timeout: self.connection.socket_timeout,
        }
    }
}

impl RedisClientBuilder for ReactiveClientBuilder {
    type Client = ReactiveClient;

    fn kind(&self) -> ClientKind { ClientKind::Reactive }

    fn connection(&self) -> &ConnectionConfig { &self.connection }

    fn connection_mut(&mut self) -> &mut ConnectionConfig { &mut self.connection }

    fn build(&self) -> Result<ReactiveClient> {
        ensure!(self.request_queue_size > 0, InvalidConfigSnafu { message: "request_queue_size must be positive" });

        let mut info = self.connection.connection_info();
        info.redis.username = self.user.clone();
        let client = redis::Client::open(info).context(RedisSnafu)?;

        let options = self.options();
        tracing::debug!(
            address = %self.connection.address(),
            database = self.connection.database,
            auto_reconnect = options.auto_reconnect,
            disconnected_behavior = %options.disconnected_behavior,
            "redis reactive client built"
        );
        Ok(ReactiveClient::new(client, options))
    }
}
