use std::fmt;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::sentinel::{Sentinel, SentinelNodeConnectionInfo};
use redis::{AsyncConnectionConfig, Client, Connection, RedisResult};

use crate::role::ServerRole;

/// 哨兵客户端
///
/// 每次打开连接都会先向哨兵查询当前的主/从节点, 再应用 builder 中的超时与客户端名称.
pub struct SentinelClient {
    sentinel: Sentinel,
    master_name: String,
    node: SentinelNodeConnectionInfo,
    server_type: ServerRole,
    connection_timeout: Option<Duration>,
    socket_timeout: Option<Duration>,
    client_name: Option<String>,
}

impl SentinelClient {
    pub(crate) fn new(
        sentinel: Sentinel,
        master_name: String,
        node: SentinelNodeConnectionInfo,
        server_type: ServerRole,
        connection_timeout: Option<Duration>,
        socket_timeout: Option<Duration>,
        client_name: Option<String>,
    ) -> Self {
        Self { sentinel, master_name, node, server_type, connection_timeout, socket_timeout, client_name }
    }

    pub fn master_name(&self) -> &str { &self.master_name }

    pub fn server_type(&self) -> ServerRole { self.server_type }

    pub fn connection_timeout(&self) -> Option<Duration> { self.connection_timeout }

    pub fn socket_timeout(&self) -> Option<Duration> { self.socket_timeout }

    pub fn client_name(&self) -> Option<&str> { self.client_name.as_deref() }

    /// 向哨兵查询目标节点, 返回的 `redis::Client` 不带超时与客户端名称
    pub fn resolve(&mut self) -> RedisResult<Client> {
        match self.server_type {
            ServerRole::Master => self.sentinel.master_for(&self.master_name, Some(&self.node)),
            ServerRole::Replica => self.sentinel.replica_for(&self.master_name, Some(&self.node)),
        }
    }

    pub async fn resolve_async(&mut self) -> RedisResult<Client> {
        match self.server_type {
            ServerRole::Master => self.sentinel.async_master_for(&self.master_name, Some(&self.node)).await,
            ServerRole::Replica => self.sentinel.async_replica_for(&self.master_name, Some(&self.node)).await,
        }
    }

    pub fn get_connection(&mut self) -> RedisResult<Connection> {
        let client = self.resolve()?;
        let mut conn = match self.connection_timeout {
            Some(timeout) => client.get_connection_with_timeout(timeout)?,
            None => client.get_connection()?,
        };
        conn.set_read_timeout(self.socket_timeout)?;
        conn.set_write_timeout(self.socket_timeout)?;
        if let Some(name) = &self.client_name {
            redis::cmd("CLIENT").arg("SETNAME").arg(name).query::<()>(&mut conn)?;
        }
        tracing::trace!(master = %self.master_name, address = %client.get_connection_info().addr, "sentinel connection opened");
        Ok(conn)
    }

    /// `socket_timeout` 作为响应超时
    pub async fn get_multiplexed_async_connection(&mut self) -> RedisResult<MultiplexedConnection> {
        let mut config = AsyncConnectionConfig::new();
        if let Some(timeout) = self.connection_timeout {
            config = config.set_connection_timeout(timeout);
        }
        if let Some(timeout) = self.socket_timeout {
            config = config.set_response_timeout(timeout);
        }

        let client = self.resolve_async().await?;
        let mut conn = client.get_multiplexed_async_connection_with_config(&config).await?;
        if let Some(name) = &self.client_name {
            redis::cmd("CLIENT").arg("SETNAME").arg(name).query_async::<()>(&mut conn).await?;
        }
        Ok(conn)
    }
}

impl fmt::Debug for SentinelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentinelClient")
            .field("master_name", &self.master_name)
            .field("server_type", &self.server_type)
            .field("connection_timeout", &self.connection_timeout)
            .field("socket_timeout", &self.socket_timeout)
            .field("client_name", &self.client_name)
            .finish_non_exhaustive()
    }
}
