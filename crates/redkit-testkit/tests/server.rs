use redis::Commands;
use redkit_testkit::FakeRedis;

#[test]
fn test_basic_commands() {
    let server = FakeRedis::start().unwrap();
    let client = redis::Client::open(server.url()).unwrap();
    let mut conn = client.get_connection().unwrap();

    let _: () = conn.set("greeting", "hello").unwrap();
    let value: String = conn.get("greeting").unwrap();
    assert_eq!(value, "hello");

    let n: i64 = conn.incr("counter", 1).unwrap();
    assert_eq!(n, 1);

    let missing: Option<String> = conn.get("missing").unwrap();
    assert!(missing.is_none());
}

#[test]
fn test_auth_and_select_from_url() {
    let server = FakeRedis::builder().with_password("secret").start().unwrap();
    let url = format!("redis://:secret@{}:{}/4", server.host(), server.port());
    let mut conn = redis::Client::open(url).unwrap().get_connection().unwrap();

    let pong: String = redis::cmd("PING").query(&mut conn).unwrap();
    assert_eq!(pong, "PONG");

    let clients = server.clients();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].db, 4);
    assert!(clients[0].authenticated);
}

#[test]
fn test_wrong_password_is_rejected() {
    let server = FakeRedis::builder().with_password("secret").start().unwrap();
    let url = format!("redis://:nope@{}", server.addr());
    assert!(redis::Client::open(url).unwrap().get_connection().is_err());
}

#[test]
fn test_kill_clients_drops_connections() {
    let server = FakeRedis::start().unwrap();
    let mut conn = redis::Client::open(server.url()).unwrap().get_connection().unwrap();
    let _: String = redis::cmd("PING").query(&mut conn).unwrap();

    server.kill_clients();
    assert!(server.clients().is_empty());
    assert!(redis::cmd("PING").query::<String>(&mut conn).is_err());
}
