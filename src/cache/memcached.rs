use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::CacheStore;
use crate::error::CacheError;

const MAX_KEY_LEN: usize = 250;
const DEFAULT_CONNECTIONS: usize = 8;

type Connection = BufStream<TcpStream>;

/// Memcached client speaking the text protocol over a small set of
/// lazily-opened connections.
///
/// A connection that fails or times out is dropped and reopened on next use.
pub struct MemcachedStore {
    addr: String,
    io_timeout: Duration,
    slots: Vec<Mutex<Option<Connection>>>,
    next_slot: AtomicUsize,
}

impl MemcachedStore {
    pub fn new(addr: impl Into<String>, io_timeout: Duration) -> Self {
        Self::with_connections(addr, io_timeout, DEFAULT_CONNECTIONS)
    }

    pub fn with_connections(addr: impl Into<String>, io_timeout: Duration, connections: usize) -> Self {
        Self {
            addr: addr.into(),
            io_timeout,
            slots: (0..connections.max(1)).map(|_| Mutex::new(None)).collect(),
            next_slot: AtomicUsize::new(0),
        }
    }

    /// Round-trip a `version` command to check the server is reachable.
    pub async fn ping(&self) -> Result<String, CacheError> {
        let line = self
            .exec(|conn| {
                Box::pin(async move {
                    conn.write_all(b"version\r\n").await?;
                    conn.flush().await?;
                    read_line(conn).await
                })
            })
            .await?;

        line.strip_prefix("VERSION ")
            .map(str::to_string)
            .ok_or_else(|| unexpected(&line))
    }

    async fn exec<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: for<'c> FnOnce(
            &'c mut Connection,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<T, CacheError>> + Send + 'c>,
        >,
    {
        let index = self.next_slot.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let mut slot = self.slots[index].lock().await;

        let result = tokio::time::timeout(self.io_timeout, async {
            if slot.is_none() {
                let stream = TcpStream::connect(&self.addr).await?;
                stream.set_nodelay(true)?;
                info!(addr = %self.addr, slot = index, "memcached connection opened");
                *slot = Some(BufStream::new(stream));
            }

            match slot.as_mut() {
                Some(conn) => op(conn).await,
                None => Err(CacheError::Protocol("connection unavailable".into())),
            }
        })
        .await
        .unwrap_or(Err(CacheError::Timeout));

        if result.is_err() {
            // the stream may hold a half-read response
            *slot = None;
        }

        result
    }
}

#[async_trait]
impl CacheStore for MemcachedStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = wire_key(key).into_owned();

        self.exec(move |conn| {
            Box::pin(async move {
                conn.write_all(format!("get {key}\r\n").as_bytes()).await?;
                conn.flush().await?;

                let header = read_line(conn).await?;
                if header == "END" {
                    return Ok(None);
                }

                let len = parse_value_header(&header, &key)?;
                let mut data = vec![0u8; len + 2];
                conn.read_exact(&mut data).await?;
                if !data.ends_with(b"\r\n") {
                    return Err(CacheError::Protocol("value block not terminated".into()));
                }
                data.truncate(len);

                let trailer = read_line(conn).await?;
                if trailer != "END" {
                    return Err(unexpected(&trailer));
                }

                Ok(Some(data))
            })
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let key = wire_key(key).into_owned();
        let value = value.to_vec();
        let exptime = ttl.as_secs();

        self.exec(move |conn| {
            Box::pin(async move {
                let header = format!("set {key} 0 {exptime} {}\r\n", value.len());
                conn.write_all(header.as_bytes()).await?;
                conn.write_all(&value).await?;
                conn.write_all(b"\r\n").await?;
                conn.flush().await?;

                match read_line(conn).await?.as_str() {
                    "STORED" => Ok(()),
                    other => Err(unexpected(other)),
                }
            })
        })
        .await
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        self.exec(|conn| {
            Box::pin(async move {
                conn.write_all(b"flush_all\r\n").await?;
                conn.flush().await?;

                match read_line(conn).await?.as_str() {
                    "OK" => Ok(()),
                    other => Err(unexpected(other)),
                }
            })
        })
        .await
    }
}

/// Keys memcached cannot carry are replaced by their SHA-256 digest.
fn wire_key(key: &str) -> Cow<'_, str> {
    let printable = key.bytes().all(|b| b.is_ascii_graphic());
    if printable && !key.is_empty() && key.len() <= MAX_KEY_LEN {
        return Cow::Borrowed(key);
    }

    debug!(key, "hashing key unsuitable for memcached");
    Cow::Owned(format!("sha256:{}", hex::encode(Sha256::digest(key.as_bytes()))))
}

/// Parse `VALUE <key> <flags> <bytes>` and return the byte count.
fn parse_value_header(line: &str, key: &str) -> Result<usize, CacheError> {
    let mut parts = line.split(' ');

    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("VALUE"), Some(found), Some(_flags), Some(len)) if found == key => len
            .parse()
            .map_err(|_| CacheError::Protocol(format!("bad value length in {line:?}"))),
        _ => Err(unexpected(line)),
    }
}

async fn read_line(conn: &mut Connection) -> Result<String, CacheError> {
    let mut line = String::new();
    let read = conn.read_line(&mut line).await?;
    if read == 0 {
        return Err(CacheError::Protocol("connection closed by server".into()));
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn unexpected(line: &str) -> CacheError {
    CacheError::Protocol(format!("unexpected response {line:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// Minimal memcached stand-in: get / set / flush_all / version.
    async fn spawn_fake_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let data: Arc<Mutex<HashMap<String, Vec<u8>>>> = Arc::default();

        tokio::spawn(async move {
            loop {
                let (socket, _) = listener.accept().await.unwrap();
                let data = data.clone();
                tokio::spawn(async move {
                    let mut conn = BufStream::new(socket);
                    loop {
                        let mut line = String::new();
                        if conn.read_line(&mut line).await.unwrap_or(0) == 0 {
                            return;
                        }
                        let parts: Vec<String> =
                            line.trim_end().split(' ').map(str::to_string).collect();
                        let reply = match parts[0].as_str() {
                            "get" => match data.lock().await.get(&parts[1]) {
                                Some(value) => {
                                    let mut out =
                                        format!("VALUE {} 0 {}\r\n", parts[1], value.len()).into_bytes();
                                    out.extend_from_slice(value);
                                    out.extend_from_slice(b"\r\nEND\r\n");
                                    out
                                }
                                None => b"END\r\n".to_vec(),
                            },
                            "set" => {
                                let len: usize = parts[4].parse().unwrap();
                                let mut value = vec![0u8; len + 2];
                                conn.read_exact(&mut value).await.unwrap();
                                value.truncate(len);
                                data.lock().await.insert(parts[1].clone(), value);
                                b"STORED\r\n".to_vec()
                            }
                            "flush_all" => {
                                data.lock().await.clear();
                                b"OK\r\n".to_vec()
                            }
                            "version" => b"VERSION 1.6.21\r\n".to_vec(),
                            _ => b"ERROR\r\n".to_vec(),
                        };
                        conn.write_all(&reply).await.unwrap();
                        conn.flush().await.unwrap();
                    }
                });
            }
        });

        addr
    }

    #[tokio::test]
    async fn set_then_get_round_trips_bytes() {
        let addr = spawn_fake_server().await;
        let store = MemcachedStore::new(addr, Duration::from_secs(2));

        assert_eq!(store.get("hotspot-abc").await.unwrap(), None);

        store
            .set("hotspot-abc", b"{\"a\":\r\n1}", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            store.get("hotspot-abc").await.unwrap(),
            Some(b"{\"a\":\r\n1}".to_vec())
        );
    }

    #[tokio::test]
    async fn keys_with_spaces_are_hashed_consistently() {
        let addr = spawn_fake_server().await;
        let store = MemcachedStore::with_connections(addr, Duration::from_secs(2), 2);

        store
            .set("search-hotspots-angry purple", b"[]", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            store.get("search-hotspots-angry purple").await.unwrap(),
            Some(b"[]".to_vec())
        );
    }

    #[tokio::test]
    async fn flush_and_ping() {
        let addr = spawn_fake_server().await;
        let store = MemcachedStore::new(addr, Duration::from_secs(2));

        store.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        store.clear_all().await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.ping().await.unwrap(), "1.6.21");
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error_not_a_miss() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let store = MemcachedStore::new(addr, Duration::from_millis(200));
        assert!(store.get("k").await.is_err());
    }

    #[test]
    fn wire_key_passes_plain_keys_through() {
        assert_eq!(wire_key("hotspot-activity-11abc-0"), "hotspot-activity-11abc-0");

        let long = "x".repeat(MAX_KEY_LEN + 1);
        let hashed = wire_key(&long);
        assert!(hashed.starts_with("sha256:"));
        assert_eq!(hashed.len(), "sha256:".len() + 64);
    }
}
