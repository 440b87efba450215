use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncConnectionConfig, Client, Connection, ConnectionInfo, RedisResult};

/// 统一客户端句柄
///
/// 通过本类型打开的连接会应用 builder 中的超时与客户端名称.
/// `inner` / `into_inner` 拿到的 `redis::Client` 不带这些设置.
#[derive(Clone, Debug)]
pub struct UnifiedClient {
    client: Client,
    connection_timeout: Option<Duration>,
    socket_timeout: Option<Duration>,
    client_name: Option<String>,
}

impl UnifiedClient {
    pub(crate) fn new(
        client: Client,
        connection_timeout: Option<Duration>,
        socket_timeout: Option<Duration>,
        client_name: Option<String>,
    ) -> Self {
        Self { client, connection_timeout, socket_timeout, client_name }
    }

    pub fn connection_timeout(&self) -> Option<Duration> { self.connection_timeout }

    pub fn socket_timeout(&self) -> Option<Duration> { self.socket_timeout }

    pub fn client_name(&self) -> Option<&str> { self.client_name.as_deref() }

    pub fn connection_info(&self) -> &ConnectionInfo { self.client.get_connection_info() }

    pub fn inner(&self) -> &Client { &self.client }

    pub fn into_inner(self) -> Client { self.client }

    /// 打开阻塞连接
    pub fn get_connection(&self) -> RedisResult<Connection> {
        let mut conn = match self.connection_timeout {
            Some(timeout) => self.client.get_connection_with_timeout(timeout)?,
            None => self.client.get_connection()?,
        };
        conn.set_read_timeout(self.socket_timeout)?;
        conn.set_write_timeout(self.socket_timeout)?;
        if let Some(name) = &self.client_name {
            redis::cmd("CLIENT").arg("SETNAME").arg(name).query::<()>(&mut conn)?;
        }
        Ok(conn)
    }

    /// 打开多路复用的异步连接, `socket_timeout` 作为响应超时
    pub async fn get_multiplexed_async_connection(&self) -> RedisResult<MultiplexedConnection> {
        let mut config = AsyncConnectionConfig::new();
        if let Some(timeout) = self.connection_timeout {
            config = config.set_connection_timeout(timeout);
        }
        if let Some(timeout) = self.socket_timeout {
            config = config.set_response_timeout(timeout);
        }

        let mut conn = self.client.get_multiplexed_async_connection_with_config(&config).await?;
        if let Some(name) = &self.client_name {
            redis::cmd("CLIENT").arg("SETNAME").arg(name).query_async::<()>(&mut conn).await?;
        }
        Ok(conn)
    }

    /// 打开连接并 PING 一次
    pub fn ping(&self) -> RedisResult<()> {
        let mut conn = self.get_connection()?;
        redis::cmd("PING").query::<()>(&mut conn)
    }
}
