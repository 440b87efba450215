use std::time::Duration;

use redkit::redis::{self, AsyncCommands, Commands};
use redkit::{AnyClient, ClientKind, RedisClientBuilder, RedisClientBuilderFactory};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().compact().with_max_level(tracing::Level::DEBUG).init();
    dotenvy::dotenv().ok();

    let host = std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("REDIS_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(6379);

    // 连接池
    let pool = RedisClientBuilderFactory::pooled()
        .with_host(&host)
        .with_port(port)
        .with_connection_timeout(Duration::from_secs(2))
        .with_max_size(8)
        .with_client_name("redkit-demo-pool")
        .build()?;
    let mut conn = pool.get()?;
    let _: () = conn.set("redkit:demo", "pooled")?;
    let value: String = conn.get("redkit:demo")?;
    info!(%value, "pooled");

    // 按名称选择
    let client = RedisClientBuilderFactory::builder_for_name("unified")?.with_host(&host).with_port(port).build()?;
    if let AnyClient::Unified(client) = client {
        let mut conn = client.get_connection()?;
        let pong: String = redis::cmd("PING").query(&mut conn)?;
        info!(%pong, kind = %ClientKind::Unified, "unified");
    }

    // 异步
    let client = RedisClientBuilderFactory::reactive()
        .with_host(&host)
        .with_port(port)
        .with_socket_timeout(Duration::from_secs(1))
        .with_request_queue_size(1024)
        .build()?;
    let mut conn = client.connect().await?;
    let n: i64 = conn.incr("redkit:demo:counter", 1).await?;
    info!(n, "reactive");

    Ok(())
}
