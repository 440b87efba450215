use redis::sentinel::{Sentinel, SentinelNodeConnectionInfo};
use redis::{ConnectionInfo, TlsMode};
use redkit_core::{
    ClientKind, ConnectionConfig, InvalidConfigSnafu, NodeAddress, RedisClientBuilder, RedisSnafu, Result, With,
};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

use crate::client::SentinelClient;
use crate::role::ServerRole;

/// 哨兵客户端 builder
///
/// 公共配置中的密码、数据库、用户名作用于哨兵发现的主/从节点;
/// 哨兵自身的认证使用 `sentinel_password`. 未添加哨兵时以公共的 host/port 作为唯一哨兵.
/// 超时与 `client_name` 作用于通过 [`SentinelClient`] 打开的节点连接.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, With)]
#[serde(default)]
pub struct SentinelClientBuilder {
    #[serde(flatten)]
    #[with(skip)]
    pub connection: ConnectionConfig,

    pub sentinels: Vec<NodeAddress>,

    /// 哨兵监控的主节点名称, 必填
    #[with(into)]
    pub master_name: Option<String>,

    /// 主/从节点的 ACL 用户名
    #[with(into)]
    pub user: Option<String>,

    #[with(into)]
    pub sentinel_password: Option<String>,

    pub server_type: ServerRole,

    /// 建立节点连接后通过 `CLIENT SETNAME` 设置
    #[with(into)]
    pub client_name: Option<String>,
}

impl SentinelClientBuilder {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn add_sentinel(mut self, host: impl Into<String>, port: u16) -> Self {
        self.sentinels.push(NodeAddress::new(host, port));
        self
    }

    fn sentinel_base(&self) -> ConnectionConfig {
        ConnectionConfig {
            password: self.sentinel_password.clone(),
            database: 0,
            ..self.connection.clone()
        }
    }

    /// 哨兵节点的连接参数
    pub fn sentinel_nodes(&self) -> Vec<ConnectionInfo> {
        let base = self.sentinel_base();
        if self.sentinels.is_empty() {
            return vec![base.connection_info()];
        }
        self.sentinels.iter().map(|node| node.connection_info(&base)).collect()
    }

    /// 主/从节点的连接参数
    pub fn node_connection_info(&self) -> SentinelNodeConnectionInfo {
        let mut redis = self.connection.redis_connection_info();
        redis.username = self.user.clone();
        SentinelNodeConnectionInfo {
            tls_mode: self.connection.ssl.then_some(TlsMode::Secure),
            redis_connection_info: Some(redis),
        }
    }
}

impl RedisClientBuilder for SentinelClientBuilder {
    type Client = SentinelClient;

    fn kind(&self) -> ClientKind { ClientKind::Sentinel }

    fn connection(&self) -> &ConnectionConfig { &self.connection }

    fn connection_mut(&mut self) -> &mut ConnectionConfig { &mut self.connection }

    fn build(&self) -> Result<SentinelClient> {
        let master_name = self
            .master_name
            .clone()
            .filter(|name| !name.is_empty())
            .context(InvalidConfigSnafu { message: "sentinel requires master_name" })?;

        let sentinel = Sentinel::build(self.sentinel_nodes()).context(RedisSnafu)?;
        let client = SentinelClient::new(
            sentinel,
            master_name.clone(),
            self.node_connection_info(),
            self.server_type,
            self.connection.connection_timeout,
            self.connection.socket_timeout,
            self.client_name.clone(),
        );

        tracing::debug!(
            master = %master_name,
            server_type = %self.server_type,
            sentinels = self.sentinels.len().max(1),
            database = self.connection.database,
            "redis sentinel client built"
        );
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use redis::ConnectionAddr;
    use redkit_core::Error;

    use super::*;

    #[test]
    fn master_name_is_required() {
        let err = SentinelClientBuilder::new().add_sentinel("127.0.0.1", 26379).build().err().unwrap();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = SentinelClientBuilder::new().with_master_name("").build().err().unwrap();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn build_does_not_connect() {
        let client = SentinelClientBuilder::new()
            .add_sentinel("127.0.0.1", 1)
            .add_sentinel("127.0.0.1", 2)
            .with_master_name("mymaster")
            .with_server_type(ServerRole::Replica)
            .with_connection_timeout(Duration::from_millis(300))
            .with_socket_timeout(Duration::from_millis(800))
            .with_client_name("orders")
            .build()
            .unwrap();

        assert_eq!(client.master_name(), "mymaster");
        assert_eq!(client.server_type(), ServerRole::Replica);
        assert_eq!(client.connection_timeout(), Some(Duration::from_millis(300)));
        assert_eq!(client.socket_timeout(), Some(Duration::from_millis(800)));
        assert_eq!(client.client_name(), Some("orders"));
    }

    #[test]
    fn credentials_split_between_sentinels_and_nodes() {
        let builder = SentinelClientBuilder::new()
            .add_sentinel("s1", 26379)
            .with_password("node-pw")
            .with_database(4)
            .with_user("app")
            .with_sentinel_password("sentinel-pw");

        let sentinels = builder.sentinel_nodes();
        assert_eq!(sentinels[0].addr, ConnectionAddr::Tcp("s1".to_string(), 26379));
        assert_eq!(sentinels[0].redis.password.as_deref(), Some("sentinel-pw"));
        assert_eq!(sentinels[0].redis.db, 0);

        let node = builder.node_connection_info();
        let redis = node.redis_connection_info.unwrap();
        assert_eq!(redis.password.as_deref(), Some("node-pw"));
        assert_eq!(redis.username.as_deref(), Some("app"));
        assert_eq!(redis.db, 4);
        assert!(node.tls_mode.is_none());
    }

    #[test]
    fn ssl_applies_to_sentinels_and_nodes() {
        let builder = SentinelClientBuilder::new().with_ssl(true).add_sentinel("s1", 26379);
        assert!(matches!(builder.sentinel_nodes()[0].addr, ConnectionAddr::TcpTls { .. }));
        assert!(matches!(builder.node_connection_info().tls_mode, Some(TlsMode::Secure)));
    }

    #[test]
    fn role_names() {
        assert_eq!(ServerRole::Master.to_string(), "master");
        assert_eq!(ServerRole::Replica.to_string(), "replica");
        assert_eq!(ServerRole::from_str("slave"), Ok(ServerRole::Replica));

        let builder: SentinelClientBuilder =
            serde_json::from_str(r#"{"master_name":"mymaster","server_type":"replica"}"#).unwrap();
        assert_eq!(builder.server_type, ServerRole::Replica);
    }
}
