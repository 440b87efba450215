use redis::ConnectionInfo;
use redkit_core::{
    ClientKind, ConnectionConfig, InvalidConfigSnafu, NodeAddress, RedisClientBuilder, RedisSnafu, Result, With,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, ensure};

use crate::client::ClusterClient;

/// 集群客户端 builder
///
/// 未添加节点时以公共的 host/port 作为唯一种子节点. 密码、用户名与 TLS 对所有节点生效,
/// `socket_timeout` 映射为响应超时.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, With)]
#[serde(default)]
pub struct ClusterClientBuilder {
    #[serde(flatten)]
    #[with(skip)]
    pub connection: ConnectionConfig,

    /// 种子节点
    pub nodes: Vec<NodeAddress>,

    /// ACL 用户名
    #[with(into)]
    pub user: Option<String>,

    /// MOVED/ASK 重定向及重试的最大次数
    pub max_redirections: Option<u32>,

    /// 只读命令可以发往从节点
    pub read_from_replicas: bool,

    /// 建立连接后通过 `CLIENT SETNAME` 设置
    #[with(into)]
    pub client_name: Option<String>,
}

impl ClusterClientBuilder {
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn add_node(mut self, host: impl Into<String>, port: u16) -> Self {
        self.nodes.push(NodeAddress::new(host, port));
        self
    }

    /// 交给 redis 库的种子节点, redis 库从第一个节点取得认证与 TLS 设置
    pub fn seed_nodes(&self) -> Vec<ConnectionInfo> {
        let mut seeds = if self.nodes.is_empty() {
            vec![self.connection.connection_info()]
        } else {
            self.nodes.iter().map(|node| node.connection_info(&self.connection)).collect()
        };
        for seed in &mut seeds {
            seed.redis.username.clone_from(&self.user);
        }
        seeds
    }
}

impl RedisClientBuilder for ClusterClientBuilder {
    type Client = ClusterClient;

    fn kind(&self) -> ClientKind { ClientKind::Cluster }

    fn connection(&self) -> &ConnectionConfig { &self.connection }

    fn connection_mut(&mut self) -> &mut ConnectionConfig { &mut self.connection }

    fn build(&self) -> Result<ClusterClient> {
        ensure!(
            self.connection.database == 0,
            InvalidConfigSnafu { message: format!("cluster only supports database 0, got {}", self.connection.database) }
        );

        let seeds = self.seed_nodes();
        let addresses = seeds.iter().map(|info| info.addr.to_string()).collect::<Vec<_>>().join(",");
        let mut builder = redis::cluster::ClusterClientBuilder::new(seeds);
        if let Some(retries) = self.max_redirections {
            builder = builder.retries(retries);
        }
        if let Some(timeout) = self.connection.connection_timeout {
            builder = builder.connection_timeout(timeout);
        }
        if let Some(timeout) = self.connection.socket_timeout {
            builder = builder.response_timeout(timeout);
        }
        if self.read_from_replicas {
            builder = builder.read_from_replicas();
        }

        let client = builder.build().context(RedisSnafu)?;
        tracing::debug!(
            nodes = %addresses,
            read_from_replicas = self.read_from_replicas,
            "redis cluster client built"
        );
        Ok(ClusterClient::new(client, self.client_name.clone()))
    }
}
