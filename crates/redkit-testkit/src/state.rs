use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::resp::Reply;

const DATABASES: i64 = 16;

/// 已连接客户端的信息, 对应 `CLIENT LIST` 的一行
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: u64,
    pub addr: SocketAddr,
    pub name: Option<String>,
    pub db: i64,
    pub user: String,
    pub authenticated: bool,
}

impl ClientInfo {
    fn line(&self) -> String {
        format!(
            "id={} addr={} name={} db={} user={}",
            self.id,
            self.addr,
            self.name.as_deref().unwrap_or(""),
            self.db,
            self.user
        )
    }
}

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool { self.expires_at.is_some_and(|at| at <= now) }
}

/// 命令执行结果
pub(crate) enum Outcome {
    Reply(Reply),
    /// 回复后关闭连接
    Close(Reply),
    /// 释放锁后等待一段时间再回复
    Delay(Duration, Reply),
}

/// 以哨兵身份对外公布的主节点
#[derive(Clone, Debug)]
pub(crate) struct MonitoredMaster {
    pub name: String,
    pub addr: SocketAddr,
}

#[derive(Default)]
pub(crate) struct State {
    pub password: Option<String>,
    pub user: Option<String>,
    pub clients: HashMap<u64, ClientInfo>,
    pub history: Vec<Vec<String>>,
    pub accepted: u64,
    pub master: Option<MonitoredMaster>,
    next_id: u64,
    data: HashMap<i64, HashMap<Vec<u8>, Entry>>,
}

impl State {
    pub fn register(&mut self, addr: SocketAddr) -> u64 {
        self.next_id += 1;
        self.accepted += 1;
        let id = self.next_id;
        let authenticated = self.password.is_none();
        let info = ClientInfo { id, addr, name: None, db: 0, user: "default".to_string(), authenticated };
        self.clients.insert(id, info);
        id
    }

    pub fn unregister(&mut self, id: u64) { self.clients.remove(&id); }

    pub fn handle(&mut self, id: u64, args: &[Vec<u8>]) -> Outcome {
        let Some(first) = args.first() else {
            return Outcome::Reply(Reply::err("ERR empty command"));
        };
        let name = String::from_utf8_lossy(first).to_ascii_uppercase();
        let argv: Vec<String> = args.iter().map(|a| String::from_utf8_lossy(a).into_owned()).collect();
        tracing::trace!(client = id, command = %name, "fake redis command");
        self.history.push(argv.clone());

        let authenticated = self.clients.get(&id).is_some_and(|c| c.authenticated);
        if !authenticated && !matches!(name.as_str(), "AUTH" | "QUIT") {
            return Outcome::Reply(Reply::err("NOAUTH Authentication required."));
        }

        let reply = match name.as_str() {
            "PING" => match argv.get(1) {
                Some(msg) => Reply::bulk(msg),
                None => Reply::Simple("PONG".to_string()),
            },
            "ECHO" if argv.len() == 2 => Reply::bulk(&args[1]),
            "AUTH" => self.auth(id, &argv[1..]),
            "SELECT" if argv.len() == 2 => self.select(id, &argv[1]),
            "CLIENT" if argv.len() >= 2 => self.client(id, &argv[1..]),
            "SET" if argv.len() >= 3 => {
                let db = self.db_of(id);
                let entry = Entry { value: args[2].clone(), expires_at: None };
                self.data.entry(db).or_default().insert(args[1].clone(), entry);
                Reply::ok()
            }
            "GET" if argv.len() == 2 => match self.live(id, &args[1]) {
                Some(entry) => Reply::bulk(&entry.value),
                None => Reply::null(),
            },
            "DEL" if argv.len() >= 2 => {
                let db = self.db_of(id);
                let now = Instant::now();
                let space = self.data.entry(db).or_default();
                let removed = args[1..].iter().filter_map(|k| space.remove(k)).filter(|e| !e.expired(now)).count();
                Reply::Integer(removed as i64)
            }
            "EXISTS" if argv.len() >= 2 => {
                let found = args[1..].iter().filter(|k| self.live(id, k).is_some()).count();
                Reply::Integer(found as i64)
            }
            "INCR" if argv.len() == 2 => self.incr(id, &args[1]),
            "EXPIRE" if argv.len() == 3 => match argv[2].parse::<u64>() {
                Ok(secs) => match self.live_mut(id, &args[1]) {
                    Some(entry) => {
                        entry.expires_at = Some(Instant::now() + Duration::from_secs(secs));
                        Reply::Integer(1)
                    }
                    None => Reply::Integer(0),
                },
                Err(_) => Reply::err("ERR value is not an integer or out of range"),
            },
            "TTL" if argv.len() == 2 => match self.live(id, &args[1]) {
                None => Reply::Integer(-2),
                Some(Entry { expires_at: None, .. }) => Reply::Integer(-1),
                Some(Entry { expires_at: Some(at), .. }) => {
                    let left = at.saturating_duration_since(Instant::now());
                    Reply::Integer(left.as_secs_f64().ceil() as i64)
                }
            },
            "FLUSHDB" => {
                let db = self.db_of(id);
                self.data.remove(&db);
                Reply::ok()
            }
            "ROLE" => Reply::Array(vec![Reply::bulk("master"), Reply::Integer(0), Reply::Array(Vec::new())]),
            "SENTINEL" if argv.len() >= 2 => self.sentinel(&argv[1..]),
            "DEBUG" if argv.len() == 3 && argv[1].eq_ignore_ascii_case("SLEEP") => match argv[2].parse::<f64>() {
                Ok(secs) if secs >= 0.0 => return Outcome::Delay(Duration::from_secs_f64(secs), Reply::ok()),
                _ => Reply::err("ERR value is not a valid float"),
            },
            "QUIT" => return Outcome::Close(Reply::ok()),
            "ECHO" | "SELECT" | "CLIENT" | "SENTINEL" | "DEBUG" | "SET" | "GET" | "DEL" | "EXISTS" | "INCR" | "EXPIRE" | "TTL" => {
                Reply::err(format!("ERR wrong number of arguments for '{}' command", name.to_ascii_lowercase()))
            }
            _ => Reply::err(format!("ERR unknown command '{}'", argv[0])),
        };
        Outcome::Reply(reply)
    }

    fn auth(&mut self, id: u64, argv: &[String]) -> Reply {
        let (user, pass) = match argv {
            [pass] => ("default", pass.as_str()),
            [user, pass] => (user.as_str(), pass.as_str()),
            _ => return Reply::err("ERR wrong number of arguments for 'auth' command"),
        };

        let Some(expected) = self.password.as_deref() else {
            return Reply::err("ERR AUTH <password> called without any password configured for the default user");
        };
        let expected_user = self.user.as_deref().unwrap_or("default");
        if pass != expected || user != expected_user {
            return Reply::err("WRONGPASS invalid username-password pair or user is disabled.");
        }

        if let Some(client) = self.clients.get_mut(&id) {
            client.authenticated = true;
            client.user = user.to_string();
        }
        Reply::ok()
    }

    fn select(&mut self, id: u64, db: &str) -> Reply {
        match db.parse::<i64>() {
            Ok(db) if (0..DATABASES).contains(&db) => {
                if let Some(client) = self.clients.get_mut(&id) {
                    client.db = db;
                }
                Reply::ok()
            }
            Ok(_) => Reply::err("ERR DB index is out of range"),
            Err(_) => Reply::err("ERR value is not an integer or out of range"),
        }
    }

    fn client(&mut self, id: u64, argv: &[String]) -> Reply {
        match argv[0].to_ascii_uppercase().as_str() {
            "SETNAME" if argv.len() == 2 => {
                if argv[1].contains(' ') {
                    return Reply::err("ERR Client names cannot contain spaces, newlines or special characters.");
                }
                if let Some(client) = self.clients.get_mut(&id) {
                    client.name = (!argv[1].is_empty()).then(|| argv[1].clone());
                }
                Reply::ok()
            }
            "GETNAME" => match self.clients.get(&id).and_then(|c| c.name.clone()) {
                Some(name) => Reply::bulk(name),
                None => Reply::null(),
            },
            "ID" => Reply::Integer(id as i64),
            "LIST" => {
                let mut clients: Vec<_> = self.clients.values().collect();
                clients.sort_by_key(|c| c.id);
                let body: String = clients.iter().map(|c| format!("{}\n", c.line())).collect();
                Reply::bulk(body)
            }
            "SETINFO" => Reply::ok(),
            other => Reply::err(format!("ERR unknown subcommand '{}'", other.to_ascii_lowercase())),
        }
    }

    fn sentinel(&self, argv: &[String]) -> Reply {
        match (argv[0].to_ascii_uppercase().as_str(), &self.master) {
            ("MASTERS", Some(master)) => {
                let fields = [
                    ("name", master.name.clone()),
                    ("ip", master.addr.ip().to_string()),
                    ("port", master.addr.port().to_string()),
                    ("flags", "master".to_string()),
                ];
                let flat = fields.into_iter().flat_map(|(k, v)| [Reply::bulk(k), Reply::bulk(v)]).collect();
                Reply::Array(vec![Reply::Array(flat)])
            }
            ("MASTERS", None) => Reply::Array(Vec::new()),
            (other, _) => Reply::err(format!("ERR unknown sentinel subcommand '{}'", other.to_ascii_lowercase())),
        }
    }

    fn incr(&mut self, id: u64, key: &[u8]) -> Reply {
        let current = match self.live(id, key) {
            Some(entry) => match std::str::from_utf8(&entry.value).ok().and_then(|s| s.parse::<i64>().ok()) {
                Some(n) => n,
                None => return Reply::err("ERR value is not an integer or out of range"),
            },
            None => 0,
        };
        let next = current + 1;
        let db = self.db_of(id);
        let space = self.data.entry(db).or_default();
        let expires_at = space.get(key).filter(|e| !e.expired(Instant::now())).and_then(|e| e.expires_at);
        space.insert(key.to_vec(), Entry { value: next.to_string().into_bytes(), expires_at });
        Reply::Integer(next)
    }

    fn db_of(&self, id: u64) -> i64 { self.clients.get(&id).map_or(0, |c| c.db) }

    fn live(&self, id: u64, key: &[u8]) -> Option<&Entry> {
        let now = Instant::now();
        self.data.get(&self.db_of(id))?.get(key).filter(|e| !e.expired(now))
    }

    fn live_mut(&mut self, id: u64, key: &[u8]) -> Option<&mut Entry> {
        let now = Instant::now();
        let db = self.db_of(id);
        self.data.get_mut(&db)?.get_mut(key).filter(|e| !e.expired(now))
    }
}
