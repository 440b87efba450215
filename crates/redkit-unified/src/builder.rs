use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo};
use redkit_core::{ClientKind, ConnectionConfig, RedisClientBuilder, RedisSnafu, Result, With};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::client::UnifiedClient;

/// 统一客户端 builder, 产出 [`UnifiedClient`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, With)]
#[serde(default)]
pub struct UnifiedClientBuilder {
    #[serde(flatten)]
    #[with(skip)]
    pub connection: ConnectionConfig,

    /// 每个新连接执行 `CLIENT SETNAME`
    #[with(into)]
    pub client_name: Option<String>,

    /// ACL 用户名
    #[with(into)]
    pub user: Option<String>,

    /// TLS 连接时跳过证书校验
    pub tls_insecure: bool,

    /// `redis://` / `rediss://` 地址, 设置后忽略 host/port/password/database/ssl/user
    #[with(into)]
    pub uri: Option<String>,

    /// 构建时立即建立连接并 PING
    pub connect_on_build: bool,
}

impl UnifiedClientBuilder {
    pub fn new() -> Self { Self::default() }

    /// 交给 redis 库的最终连接参数
    pub fn connection_info(&self) -> Result<ConnectionInfo> {
        if let Some(uri) = &self.uri {
            return uri.as_str().into_connection_info().context(RedisSnafu);
        }

        let mut info = self.connection.connection_info();
        info.redis.username = self.user.clone();
        if let ConnectionAddr::TcpTls { insecure, .. } = &mut info.addr {
            *insecure = self.tls_insecure;
        }
        Ok(info)
    }
}

impl RedisClientBuilder for UnifiedClientBuilder {
    type Client = UnifiedClient;

    fn kind(&self) -> ClientKind { ClientKind::Unified }

    fn connection(&self) -> &ConnectionConfig { &self.connection }

    fn connection_mut(&mut self) -> &mut ConnectionConfig { &mut self.connection }

    fn build(&self) -> Result<UnifiedClient> {
        let info = self.connection_info()?;
        tracing::debug!(
            address = %info.addr,
            database = info.redis.db,
            user = ?info.redis.username,
            client_name = ?self.client_name,
            "redis unified client built"
        );

        let client = redis::Client::open(info).context(RedisSnafu)?;
        let client = UnifiedClient::new(
            client,
            self.connection.connection_timeout,
            self.connection.socket_timeout,
            self.client_name.clone(),
        );
        if self.connect_on_build {
            client.ping().context(RedisSnafu)?;
        }
        Ok(client)
    }
}
