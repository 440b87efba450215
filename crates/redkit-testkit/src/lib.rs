//! 测试用的进程内 Redis 服务端
//!
//! 只实现 builder 测试需要的一小部分命令, 足以验证握手阶段的
//! `AUTH` / `SELECT` / `CLIENT SETNAME` 以及基本读写.

mod resp;
mod state;

use std::collections::HashMap;
use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub use resp::{Reply, read_command};
pub use state::ClientInfo;
use state::{MonitoredMaster, Outcome, State};

const ACCEPT_POLL: Duration = Duration::from_millis(5);

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    streams: Mutex<HashMap<u64, TcpStream>>,
    stopped: AtomicBool,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> { self.state.lock().unwrap_or_else(|e| e.into_inner()) }

    fn streams(&self) -> MutexGuard<'_, HashMap<u64, TcpStream>> { self.streams.lock().unwrap_or_else(|e| e.into_inner()) }
}

/// 启动参数
#[derive(Clone, Debug, Default)]
pub struct FakeRedisBuilder {
    password: Option<String>,
    user: Option<String>,
    master_name: Option<String>,
}

impl FakeRedisBuilder {
    /// 要求客户端先 `AUTH`
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// ACL 用户名, 需要与密码一起使用
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// 同时充当哨兵, `SENTINEL MASTERS` 把自己报告为名为 `name` 的主节点
    pub fn with_sentinel_master(mut self, name: impl Into<String>) -> Self {
        self.master_name = Some(name.into());
        self
    }

    pub fn start(self) -> io::Result<FakeRedis> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        let shared = Arc::new(Shared::default());
        {
            let mut state = shared.state();
            state.password = self.password;
            state.user = self.user;
            state.master = self.master_name.map(|name| MonitoredMaster { name, addr });
        }

        let accept_shared = shared.clone();
        let accept = thread::Builder::new()
            .name("fake-redis-accept".to_string())
            .spawn(move || accept_loop(listener, accept_shared))?;

        tracing::debug!(%addr, "fake redis started");
        Ok(FakeRedis { addr, shared, accept: Some(accept) })
    }
}

/// 监听本地随机端口的假 Redis, drop 时关闭
pub struct FakeRedis {
    addr: SocketAddr,
    shared: Arc<Shared>,
    accept: Option<JoinHandle<()>>,
}

impl FakeRedis {
    pub fn builder() -> FakeRedisBuilder { FakeRedisBuilder::default() }

    pub fn start() -> io::Result<Self> { Self::builder().start() }

    pub fn host(&self) -> String { self.addr.ip().to_string() }

    pub fn port(&self) -> u16 { self.addr.port() }

    pub fn addr(&self) -> SocketAddr { self.addr }

    pub fn url(&self) -> String { format!("redis://{}", self.addr) }

    /// 当前仍然连接的客户端, 按连接先后排序
    pub fn clients(&self) -> Vec<ClientInfo> {
        let mut clients: Vec<_> = self.shared.state().clients.values().cloned().collect();
        clients.sort_by_key(|c| c.id);
        clients
    }

    pub fn client_names(&self) -> Vec<String> { self.clients().into_iter().filter_map(|c| c.name).collect() }

    /// 自启动以来接受的连接总数
    pub fn accepted(&self) -> u64 { self.shared.state().accepted }

    /// 收到的全部命令, 命令名保持客户端发送时的大小写
    pub fn commands(&self) -> Vec<Vec<String>> { self.shared.state().history.clone() }

    /// 某个命令被调用的次数, 忽略大小写
    pub fn count(&self, command: &str) -> usize {
        let state = self.shared.state();
        state.history.iter().filter(|argv| argv.first().is_some_and(|c| c.eq_ignore_ascii_case(command))).count()
    }

    /// 断开所有客户端连接, 服务端继续接受新连接
    pub fn kill_clients(&self) {
        let streams: Vec<_> = self.shared.streams().drain().collect();
        for (id, stream) in streams {
            let _ = stream.shutdown(Shutdown::Both);
            self.shared.state().unregister(id);
        }
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        if let Some(handle) = self.accept.take() {
            let _ = handle.join();
        }
        self.kill_clients();
    }
}

fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    while !shared.stopped.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = spawn_connection(stream, peer, shared.clone()) {
                    tracing::warn!(%peer, error = %e, "fake redis failed to serve connection");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                tracing::warn!(error = %e, "fake redis accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn spawn_connection(stream: TcpStream, peer: SocketAddr, shared: Arc<Shared>) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    let id = shared.state().register(peer);
    shared.streams().insert(id, stream.try_clone()?);

    thread::Builder::new().name(format!("fake-redis-conn-{id}")).spawn(move || {
        if let Err(e) = serve(id, stream, &shared) {
            tracing::trace!(client = id, error = %e, "fake redis connection closed");
        }
        shared.streams().remove(&id);
        shared.state().unregister(id);
    })?;
    Ok(())
}

fn serve(id: u64, stream: TcpStream, shared: &Shared) -> io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    while let Some(args) = read_command(&mut reader)? {
        let outcome = shared.state().handle(id, &args);
        match outcome {
            Outcome::Reply(reply) => reply.write_to(&mut writer)?,
            Outcome::Delay(delay, reply) => {
                thread::sleep(delay);
                reply.write_to(&mut writer)?;
            }
            Outcome::Close(reply) => {
                reply.write_to(&mut writer)?;
                return Ok(());
            }
        }
    }
    Ok(())
}
