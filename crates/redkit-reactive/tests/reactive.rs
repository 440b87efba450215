use std::time::{Duration, Instant};

use redis::AsyncCommands;
use redkit_core::RedisClientBuilder;
use redkit_reactive::{DisconnectedBehavior, ReactiveClientBuilder};
use redkit_testkit::FakeRedis;

fn builder_for(server: &FakeRedis) -> ReactiveClientBuilder {
    ReactiveClientBuilder::new().with_host(server.host()).with_port(server.port())
}

#[tokio::test]
async fn test_build_is_lazy() {
    let server = FakeRedis::start().unwrap();
    let _client = builder_for(&server).build().unwrap();
    assert_eq!(server.accepted(), 0);
}

#[tokio::test]
async fn test_managed_connection_round_trip() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server).with_database(1).build().unwrap();

    let mut conn = client.connect().await.unwrap();
    assert!(conn.is_managed());
    let _: () = conn.set("k", "v").await.unwrap();
    let value: String = conn.get("k").await.unwrap();
    assert_eq!(value, "v");
    assert_eq!(server.clients()[0].db, 1);
}

#[tokio::test]
async fn test_plain_multiplexed_connection() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server).with_auto_reconnect(false).build().unwrap();

    let mut conn = client.connect().await.unwrap();
    assert!(!conn.is_managed());
    let n: i64 = conn.incr("counter", 1).await.unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn test_commands_on_spawned_tasks() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server).with_publish_on_scheduler(true).build().unwrap();

    let mut conn = client.connect().await.unwrap();
    let pong: String = redis::cmd("PING").query_async(&mut conn).await.unwrap();
    assert_eq!(pong, "PONG");

    let (a, b): (i64, i64) = redis::pipe().incr("c", 1).incr("c", 1).query_async(&mut conn).await.unwrap();
    assert_eq!((a, b), (1, 2));
}

#[tokio::test]
async fn test_accepting_behavior_survives_disconnect() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server).with_disconnected_behavior(DisconnectedBehavior::AcceptCommands).build().unwrap();

    let mut conn = client.connect().await.unwrap();
    let _: () = conn.set("k", "v").await.unwrap();

    server.kill_clients();
    let pong: String = redis::cmd("PING").query_async(&mut conn).await.unwrap();
    assert_eq!(pong, "PONG");
    assert!(server.accepted() >= 2);
}

#[tokio::test]
async fn test_rejecting_behavior_fails_fast() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server).with_auto_reconnect(false).build().unwrap();

    let mut conn = client.connect().await.unwrap();
    server.kill_clients();

    let result: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_connect_reports_refused_connection() {
    let server = FakeRedis::start().unwrap();
    let port = server.port();
    drop(server);

    let client = ReactiveClientBuilder::new().with_port(port).with_auto_reconnect(false).build().unwrap();
    assert!(client.connect().await.is_err());
}

#[tokio::test]
async fn test_rejecting_behavior_fails_fast_while_reconnecting() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server).with_disconnected_behavior(DisconnectedBehavior::RejectCommands).build().unwrap();

    let mut conn = client.connect().await.unwrap();
    assert!(conn.is_managed());
    drop(server);

    let first: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
    assert!(first.is_err());
    assert!(conn.is_disconnected());

    let started = Instant::now();
    let second = tokio::time::timeout(Duration::from_secs(2), redis::cmd("PING").query_async::<String>(&mut conn))
        .await
        .expect("rejected command must not wait for the reconnect");
    assert!(second.unwrap_err().is_connection_dropped());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_rejecting_behavior_recovers_after_reconnect() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server).with_disconnected_behavior(DisconnectedBehavior::RejectCommands).build().unwrap();

    let mut conn = client.connect().await.unwrap();
    server.kill_clients();
    let first: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
    assert!(first.is_err());

    tokio::time::timeout(Duration::from_secs(5), async {
        while conn.is_disconnected() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("background reconnect should restore the connection");

    let pong: String = redis::cmd("PING").query_async(&mut conn).await.unwrap();
    assert_eq!(pong, "PONG");
}

#[tokio::test]
async fn test_timed_out_command_is_not_resent() {
    let server = FakeRedis::start().unwrap();
    let client = builder_for(&server)
        .with_auto_reconnect(false)
        .with_disconnected_behavior(DisconnectedBehavior::AcceptCommands)
        .with_socket_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let mut conn = client.connect().await.unwrap();
    let result: redis::RedisResult<()> = redis::cmd("DEBUG").arg("SLEEP").arg("0.5").query_async(&mut conn).await;
    assert!(result.unwrap_err().is_timeout());
    assert!(!conn.is_disconnected());

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(server.count("DEBUG"), 1);
}
