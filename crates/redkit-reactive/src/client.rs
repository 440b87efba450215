use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncConnectionConfig, Client, ConnectionInfo, RedisResult};

use crate::behavior::DisconnectedBehavior;
use crate::connection::{ReactiveConnection, RequestQueue};

/// 构建后交给 redis 库的异步连接选项
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReactiveOptions {
    pub auto_reconnect: bool,
    pub request_queue_size: usize,
    pub publish_on_scheduler: bool,
    pub disconnected_behavior: DisconnectedBehavior,
    pub reconnect_retries: Option<usize>,
    pub connection_timeout: Option<Duration>,
    pub response_timeout: Option<Duration>,
}

impl ReactiveOptions {
    pub fn accepts_when_disconnected(&self) -> bool { self.disconnected_behavior.accepts_commands(self.auto_reconnect) }

    pub fn connection_manager_config(&self) -> ConnectionManagerConfig {
        let mut config = ConnectionManagerConfig::new();
        if let Some(retries) = self.reconnect_retries {
            config = config.set_number_of_retries(retries);
        }
        if let Some(timeout) = self.connection_timeout {
            config = config.set_connection_timeout(timeout);
        }
        if let Some(timeout) = self.response_timeout {
            config = config.set_response_timeout(timeout);
        }
        config
    }

    pub fn async_connection_config(&self) -> AsyncConnectionConfig {
        let mut config = AsyncConnectionConfig::new();
        if let Some(timeout) = self.connection_timeout {
            config = config.set_connection_timeout(timeout);
        }
        if let Some(timeout) = self.response_timeout {
            config = config.set_response_timeout(timeout);
        }
        config
    }
}

/// 异步客户端, `connect` 时才真正建立连接
///
/// `into_inner` 拿到的 `redis::Client` 不带重连与请求队列设置.
#[derive(Clone, Debug)]
pub struct ReactiveClient {
    client: Client,
    options: ReactiveOptions,
}

impl ReactiveClient {
    pub(crate) fn new(client: Client, options: ReactiveOptions) -> Self { Self { client, options } }

    pub fn options(&self) -> &ReactiveOptions { &self.options }

    pub fn connection_info(&self) -> &ConnectionInfo { self.client.get_connection_info() }

    pub fn into_inner(self) -> Client { self.client }

    pub async fn connect(&self) -> RedisResult<ReactiveConnection> {
        let options = &self.options;
        let queue = RequestQueue::new(options.request_queue_size);
        let accept = options.accepts_when_disconnected();

        let conn = if options.auto_reconnect {
            let manager = ConnectionManager::new_with_config(self.client.clone(), options.connection_manager_config()).await?;
            ReactiveConnection::managed(manager, queue, accept, options.publish_on_scheduler)
        } else {
            let conn = self.client.get_multiplexed_async_connection_with_config(&options.async_connection_config()).await?;
            ReactiveConnection::multiplexed(conn, queue, accept, options.publish_on_scheduler)
        };

        tracing::debug!(
            address = %self.client.get_connection_info().addr,
            managed = conn.is_managed(),
            "redis reactive connection established"
        );
        Ok(conn)
    }
}
