use std::{future::Future, io, net::SocketAddr, time::Duration};

use bytes::{Buf, BytesMut};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::Instrument;

use crate::{
    config::Config,
    error::{Error, Result},
    http::{self, RequestHead},
    query::FixtureQuery,
    responder,
    response::{Encoding, Response},
};

const LISTEN_BACKLOG: i32 = 1024;
const READ_BUFFER_SIZE: usize = 4096;
const LINGER_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-connection limits, copied into every connection task.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub max_head_bytes: usize,
    pub idle_timeout: Duration,
}

impl From<&Config> for ConnectionSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_head_bytes: config.max_head_bytes,
            idle_timeout: config.idle_timeout,
        }
    }
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let listener = bind(config.listen)?;
    tracing::info!(message = "Accepting requests.", threads = config.workers, addr = %listener.local_addr()?);
    serve(listener, config.into(), shutdown_signal()).await
}

pub fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    TcpListener::from_std(socket.into())
}

/// Accepts connections until `shutdown` resolves. Each connection runs in its
/// own task and shares nothing with the others.
pub async fn serve<F>(
    listener: TcpListener,
    settings: ConnectionSettings,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let accepted = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                return Ok(());
            }
            accepted = listener.accept() => accepted,
        };

        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(message = "Failed to accept connection", %err);
                continue;
            }
        };

        let span = tracing::debug_span!("connection", %peer);
        tokio::spawn(
            async move {
                tracing::debug!("Accepted connection");
                match serve_connection(stream, settings).await {
                    Ok(()) => tracing::debug!("Closing connection"),
                    Err(err) => tracing::debug!(message = "Connection failed", %err),
                }
            }
            .instrument(span),
        );
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(message = "Failed to listen for ctrl-c", %err);
        std::future::pending::<()>().await;
    }
}

async fn serve_connection(mut stream: TcpStream, settings: ConnectionSettings) -> Result<()> {
    let mut read_buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
    let mut write_buf = BytesMut::with_capacity(READ_BUFFER_SIZE);

    loop {
        let head = match read_head(&mut stream, &mut read_buf, settings).await {
            Ok(Some(head)) => head,
            Ok(None) => return Ok(()),
            Err(err) => {
                reject(&mut stream, &mut write_buf, &err).await;
                return Err(err);
            }
        };
        read_buf.advance(head.head_len);
        tracing::debug!(message = "Successfully parsed request", method = %head.method, path = %head.target);

        if !skip_body(&mut stream, &mut read_buf, head.body_len, settings).await? {
            return Ok(());
        }

        let response = handle(&head);
        let encoding = if head.is_head() {
            Encoding::HeadOnly
        } else {
            Encoding::Full
        };
        write_buf.clear();
        response.encode(&mut write_buf, encoding, head.keep_alive);
        stream.write_all(&write_buf).await?;
        let content_type = response
            .headers
            .get("Content-Type")
            .map(String::from_utf8_lossy);
        tracing::debug!(message = "Wrote response", bytes = write_buf.len(), content_type = content_type.as_deref());

        if !head.keep_alive {
            stream.shutdown().await?;
            return Ok(());
        }
    }
}

fn handle(head: &RequestHead) -> Response {
    let query = FixtureQuery::from_target(&head.target);
    responder::respond(&query, &mut rand::thread_rng())
}

/// Reads until a complete head is buffered. `Ok(None)` means the peer went
/// away or stayed idle for too long between requests.
async fn read_head(
    stream: &mut TcpStream,
    read_buf: &mut BytesMut,
    settings: ConnectionSettings,
) -> Result<Option<RequestHead>> {
    loop {
        if !read_buf.is_empty() {
            if let Some(head) = http::parse_head(&read_buf[..], settings.max_head_bytes)? {
                return Ok(Some(head));
            }
        }

        let read = tokio::time::timeout(settings.idle_timeout, stream.read_buf(read_buf)).await;
        match read {
            Err(_elapsed) => {
                tracing::debug!("Idle timeout");
                return Ok(None);
            }
            Ok(Ok(0)) => {
                if !read_buf.is_empty() {
                    tracing::debug!(message = "Peer closed mid-request", buffered = read_buf.len());
                }
                return Ok(None);
            }
            Ok(Ok(_)) => (),
            Ok(Err(err)) => return Err(err.into()),
        }
    }
}

/// Drops a `Content-Length` request body. Bytes after it stay buffered for the
/// next pipelined request. Returns `false` if the peer closed first or let the
/// body stall for longer than the idle timeout.
async fn skip_body(
    stream: &mut TcpStream,
    read_buf: &mut BytesMut,
    body_len: usize,
    settings: ConnectionSettings,
) -> Result<bool> {
    let buffered = body_len.min(read_buf.len());
    read_buf.advance(buffered);
    let mut remaining = body_len - buffered;

    while remaining > 0 {
        let read = tokio::time::timeout(settings.idle_timeout, stream.read_buf(read_buf)).await;
        match read {
            Err(_elapsed) => {
                tracing::debug!(message = "Request body stalled", remaining);
                return Ok(false);
            }
            Ok(Ok(0)) => return Ok(false),
            Ok(Ok(_)) => (),
            Ok(Err(err)) => return Err(err.into()),
        }
        let take = remaining.min(read_buf.len());
        read_buf.advance(take);
        remaining -= take;
    }
    Ok(true)
}

/// Answers a request that could not be parsed, then closes the connection
/// while draining what the peer still sends so the answer is not lost to a
/// reset.
async fn reject(stream: &mut TcpStream, write_buf: &mut BytesMut, err: &Error) {
    let Some(status) = err.status() else {
        return;
    };
    write_buf.clear();
    Response::transport_error(status).encode(write_buf, Encoding::Full, false);
    if stream.write_all(&write_buf[..]).await.is_err() || stream.shutdown().await.is_err() {
        return;
    }

    let mut scratch = [0u8; READ_BUFFER_SIZE];
    let _ = tokio::time::timeout(LINGER_TIMEOUT, async {
        while let Ok(read) = stream.read(&mut scratch).await {
            if read == 0 {
                break;
            }
        }
    })
    .await;
}
