use std::fmt;

use redis::RedisResult;
use redis::cluster::ClusterConnection;

/// 集群客户端句柄
///
/// 通过本类型打开的连接会向所有节点发送 `CLIENT SETNAME`.
/// 拓扑变化后新建立的节点连接不会带上客户端名称.
#[derive(Clone)]
pub struct ClusterClient {
    client: redis::cluster::ClusterClient,
    client_name: Option<String>,
}

impl ClusterClient {
    pub(crate) fn new(client: redis::cluster::ClusterClient, client_name: Option<String>) -> Self {
        Self { client, client_name }
    }

    pub fn client_name(&self) -> Option<&str> { self.client_name.as_deref() }

    pub fn inner(&self) -> &redis::cluster::ClusterClient { &self.client }

    pub fn into_inner(self) -> redis::cluster::ClusterClient { self.client }

    pub fn get_connection(&self) -> RedisResult<ClusterConnection> {
        let mut conn = self.client.get_connection()?;
        if let Some(name) = &self.client_name {
            redis::cmd("CLIENT").arg("SETNAME").arg(name).query::<()>(&mut conn)?;
        }
        Ok(conn)
    }

    #[cfg(feature = "cluster-async")]
    pub async fn get_async_connection(&self) -> RedisResult<redis::cluster_async::ClusterConnection> {
        let mut conn = self.client.get_async_connection().await?;
        if let Some(name) = &self.client_name {
            redis::cmd("CLIENT").arg("SETNAME").arg(name).query_async::<()>(&mut conn).await?;
        }
        Ok(conn)
    }
}

impl fmt::Debug for ClusterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterClient").field("client_name", &self.client_name).finish_non_exhaustive()
    }
}
