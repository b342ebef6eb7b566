//! The Builder's request/response exchange.
//!
//! Every exchange opens a fresh connection and runs:
//!
//! ```text
//! -> STARTUP
//! -> <COMMAND>
//! -> payload lines
//! <- response, until the request's completion rule holds
//! -> SHUTDOWN
//! ```
//!
//! after which the write side is shut down and the connection drained until
//! the Builder closes it. A [`WireClient`] runs at most one exchange at a
//! time; nothing is retried and nothing times out.

use crate::{
    config::{self, ServerConfig},
    error::{ClientError, Result},
};
use log::{debug, info, warn};
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI8, Ordering},
        Arc,
    },
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
};
use wise_core::calc::{self, Calculation, ResponseShape};
use wise_utils::fields::field_offset;

pub const STARTUP: &str = "STARTUP";
pub const SHUTDOWN: &str = "SHUTDOWN";

/// Separators counted by [`Completion::Arity`].
pub const FIELD_SEPARATORS: &[char] = &['|', '\r', '\n'];

const CHUNK_SIZE: usize = 4096;

/// Lifecycle of the latest exchange on a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum FetchState {
    Idle = 0,
    InFlight = -1,
    Completed = 1,
    Failed = 2,
}

impl FetchState {
    fn from_raw(raw: i8) -> FetchState {
        match raw {
            -1 => FetchState::InFlight,
            1 => FetchState::Completed,
            2 => FetchState::Failed,
            _ => FetchState::Idle,
        }
    }
}

/// When enough of the response has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Any data at all.
    FirstChunk,
    /// A field holding exactly this text, wherever it falls in the buffer.
    /// The field and anything after it are dropped.
    Sentinel(&'static str),
    /// A fixed-size answer. The Builder writes it in one go, so the first
    /// chunk is the whole answer; `fields` is only checked to log a short
    /// reply, which the parser then reports as not calculated.
    Arity {
        fields: usize,
        separators: &'static [char],
    },
}

impl Completion {
    pub fn arity(fields: usize) -> Completion {
        Completion::Arity {
            fields,
            separators: FIELD_SEPARATORS,
        }
    }

    /// Whether `buffer` satisfies the rule.
    pub fn is_satisfied(&self, buffer: &str) -> bool {
        match *self {
            Completion::FirstChunk | Completion::Arity { .. } => !buffer.is_empty(),
            Completion::Sentinel(sentinel) => field_offset(buffer, sentinel).is_some(),
        }
    }

    /// Non-empty fields in `buffer` short of what the rule expects.
    fn missing_fields(&self, buffer: &str) -> usize {
        match *self {
            Completion::Arity { fields, separators } => {
                let found = buffer
                    .split(separators)
                    .filter(|field| !field.trim().is_empty())
                    .count();
                fields.saturating_sub(found)
            }
            _ => 0,
        }
    }

    /// Response text kept once the rule holds.
    fn keep(&self, buffer: String) -> String {
        match *self {
            Completion::Sentinel(sentinel) => match field_offset(&buffer, sentinel) {
                Some(offset) => buffer[..offset].to_string(),
                None => buffer,
            },
            _ => buffer,
        }
    }
}

impl From<ResponseShape> for Completion {
    fn from(shape: ResponseShape) -> Self {
        match shape {
            ResponseShape::Fields(fields) => Completion::arity(fields),
            ResponseShape::Sentinel => Completion::Sentinel(calc::COMPLETE),
        }
    }
}

/// One exchange to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: String,
    pub lines: Vec<String>,
    pub completion: Completion,
}

impl Request {
    pub fn new(command: impl Into<String>, lines: Vec<String>, completion: Completion) -> Self {
        Request {
            command: command.into(),
            lines,
            completion,
        }
    }

    pub fn calculation<C: Calculation>(calculation: &C) -> Self {
        Request::new(C::COMMAND, calculation.payload(), C::SHAPE.into())
    }
}

/// Raw response text, already cut at a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    pub body: String,
}

/// An exchange that has claimed its client and runs when awaited.
pub type PendingResponse = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

/// Drive one exchange over an already connected stream.
pub async fn run_exchange<S>(mut stream: S, request: &Request) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut outbound = String::new();
    for line in [STARTUP, request.command.as_str()]
        .into_iter()
        .chain(request.lines.iter().map(String::as_str))
    {
        outbound.push_str(line);
        outbound.push('\n');
    }
    stream.write_all(outbound.as_bytes()).await?;
    stream.flush().await?;
    debug!("Sent {} with {} payload lines", request.command, request.lines.len());

    let mut received = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut peer_closed = false;
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            warn!("Builder closed the connection before {} completed", request.command);
            peer_closed = true;
            break;
        }
        received.extend_from_slice(&chunk[..read]);
        if request
            .completion
            .is_satisfied(&String::from_utf8_lossy(&received))
        {
            break;
        }
    }

    if !peer_closed {
        if let Err(e) = finish(&mut stream, &mut chunk).await {
            debug!("Closing {} after its reply failed: {e}", request.command);
        }
    }

    let text = String::from_utf8_lossy(&received).into_owned();
    let missing = request.completion.missing_fields(&text);
    if missing > 0 {
        warn!("{} reply is {missing} fields short", request.command);
    }
    let body = request.completion.keep(text);
    debug!("{} returned {} bytes", request.command, body.len());
    Ok(Response { body })
}

/// Say goodbye and wait for the Builder to hang up.
async fn finish<S>(stream: &mut S, chunk: &mut [u8]) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(format!("{SHUTDOWN}\n").as_bytes()).await?;
    stream.shutdown().await?;
    while stream.read(chunk).await? != 0 {}
    Ok(())
}

async fn exchange(address: String, request: Request) -> Result<Response> {
    debug!("Connecting to Builder at {address}");
    let stream = TcpStream::connect(&address).await?;
    run_exchange(stream, &request).await
}

/// A connection factory with a single-request guard.
#[derive(Debug, Clone)]
pub struct WireClient {
    config: ServerConfig,
    state: Arc<AtomicI8>,
}

impl WireClient {
    pub fn new(config: ServerConfig) -> Self {
        WireClient {
            config,
            state: Arc::new(AtomicI8::new(FetchState::Idle as i8)),
        }
    }

    /// A client on the process-wide endpoint as it is right now.
    pub fn from_global() -> Self {
        WireClient::new(config::global())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> FetchState {
        FetchState::from_raw(self.state.load(Ordering::SeqCst))
    }

    /// Claim the client and return the exchange.
    ///
    /// Fails at once with [`ClientError::ConcurrentRequest`] while another
    /// exchange is in flight; that exchange is not disturbed. Dropping the
    /// returned future unpolled leaves the client claimed.
    pub fn send(&self, request: Request) -> Result<PendingResponse> {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |raw| {
                (raw != FetchState::InFlight as i8).then_some(FetchState::InFlight as i8)
            })
            .map_err(|_| ClientError::ConcurrentRequest)?;

        let state = Arc::clone(&self.state);
        let address = self.config.address();
        Ok(Box::pin(async move {
            let command = request.command.clone();
            let result = exchange(address, request).await;
            match &result {
                Ok(_) => {
                    info!("{command} completed");
                    state.store(FetchState::Completed as i8, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!("{command} failed: {e}");
                    state.store(FetchState::Failed as i8, Ordering::SeqCst);
                }
            }
            result
        }))
    }

    /// Callback form of [`send`](Self::send): the exchange runs on the tokio
    /// runtime and `callback` sees its one outcome.
    pub fn send_with<F>(&self, request: Request, callback: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<Response>) + Send + 'static,
    {
        let pending = self.send(request)?;
        Ok(tokio::spawn(async move { callback(pending.await) }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::{io::duplex, net::TcpListener, sync::oneshot};

    /// A Builder that answers with `reply` at once and returns everything
    /// it was sent.
    pub(crate) async fn fake_builder(reply: &'static str) -> (ServerConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(reply.as_bytes()).await.unwrap();
            let mut received = String::new();
            socket.read_to_string(&mut received).await.unwrap();
            received
        });
        (ServerConfig::new("127.0.0.1", port), server)
    }

    /// A Builder that answers with `reply`, then keeps the connection open
    /// until it reads `SHUTDOWN`. Returns everything it was sent.
    pub(crate) async fn patient_builder(reply: &'static str) -> (ServerConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(reply.as_bytes()).await.unwrap();
            let mut received = Vec::new();
            let mut chunk = [0u8; 256];
            while !String::from_utf8_lossy(&received).contains("SHUTDOWN\n") {
                let read = socket.read(&mut chunk).await.unwrap();
                assert_ne!(read, 0, "client hung up without SHUTDOWN");
                received.extend_from_slice(&chunk[..read]);
            }
            String::from_utf8(received).unwrap()
        });
        (ServerConfig::new("127.0.0.1", port), server)
    }

    #[test]
    fn test_completion_rules() {
        assert!(!Completion::FirstChunk.is_satisfied(""));
        assert!(Completion::FirstChunk.is_satisfied("x"));

        let sentinel = Completion::Sentinel("COMPLETE");
        assert!(!sentinel.is_satisfied("a|b\nCOMPL"));
        assert!(!sentinel.is_satisfied("a|COMPLETED\n"));
        assert!(sentinel.is_satisfied("a|b\nCOMPLETE"));
        assert!(sentinel.is_satisfied("a|b|COMPLETE|c"));
        assert!(sentinel.is_satisfied("a|b\r\nCOMPLETE\r\n"));
        assert_eq!(sentinel.keep("a|b\nCOMPLETE".into()), "a|b\n");
        assert_eq!(sentinel.keep("COMPLETE\n".into()), "");

        let arity = Completion::arity(3);
        assert!(!arity.is_satisfied(""));
        assert!(arity.is_satisfied("1|2"));
        assert!(arity.is_satisfied("1|2|3\n"));
        assert_eq!(arity.missing_fields("1|2\n"), 1);
        assert_eq!(arity.missing_fields("1|2\r\n3\r\n"), 0);
    }

    #[tokio::test]
    async fn test_sentinel_stops_accumulation() {
        let (client, mut server) = duplex(1024);
        let builder = tokio::spawn(async move {
            server
                .write_all(b"C-1|Spruce-Lichen Woodland\nCOMPLETE\nleftover\n")
                .await
                .unwrap();
            let mut received = String::new();
            server.read_to_string(&mut received).await.unwrap();
            received
        });

        let request = Request::new("LISTFUELS", Vec::new(), Completion::Sentinel("COMPLETE"));
        let response = run_exchange(client, &request).await.unwrap();

        assert_eq!(response.body, "C-1|Spruce-Lichen Woodland\n");
        assert_eq!(builder.await.unwrap(), "STARTUP\nLISTFUELS\nSHUTDOWN\n");
    }

    #[tokio::test]
    async fn test_sentinel_without_line_break() {
        let (config, server) = patient_builder("C-1|Spruce-Lichen Woodland\nCOMPLETE").await;
        let client = WireClient::new(config);
        let request = Request::new("LISTFUELS", Vec::new(), Completion::Sentinel("COMPLETE"));
        let response = client.send(request).unwrap().await.unwrap();
        assert_eq!(response.body, "C-1|Spruce-Lichen Woodland\n");
        assert_eq!(client.state(), FetchState::Completed);
        assert_eq!(server.await.unwrap(), "STARTUP\nLISTFUELS\nSHUTDOWN\n");
    }

    #[tokio::test]
    async fn test_short_reply_completes() {
        for reply in ["8.5|8.1|8.5\n", "8.5|8.1|8.5"] {
            let (config, server) = patient_builder(reply).await;
            let client = WireClient::new(config);
            let request = Request::new("FBP", vec!["C-1".into()], Completion::arity(25));
            let response = client.send(request).unwrap().await.unwrap();
            assert_eq!(response.body, reply);
            assert_eq!(client.state(), FetchState::Completed);
            assert!(server.await.unwrap().ends_with("C-1\nSHUTDOWN\n"));
        }
    }

    #[tokio::test]
    async fn test_early_close_returns_partial_response() {
        let (client, mut server) = duplex(1024);
        tokio::spawn(async move {
            let mut request = [0u8; 64];
            let _ = server.read(&mut request).await.unwrap();
            server.write_all(b"C-1|Spruce\n").await.unwrap();
        });
        let request = Request::new("LISTFUELS", Vec::new(), Completion::Sentinel("COMPLETE"));
        let response = run_exchange(client, &request).await.unwrap();
        assert_eq!(response.body, "C-1|Spruce\n");
    }

    #[tokio::test]
    async fn test_reply_then_hang_up() {
        let (client, mut server) = duplex(1024);
        tokio::spawn(async move {
            let mut request = [0u8; 64];
            let _ = server.read(&mut request).await.unwrap();
            server.write_all(b"job_1\n").await.unwrap();
        });
        let request = Request::new("BEGINDATA", Vec::new(), Completion::FirstChunk);
        let response = run_exchange(client, &request).await.unwrap();
        assert_eq!(response.body, "job_1\n");
    }

    #[tokio::test]
    async fn test_second_request_while_in_flight_fails() {
        let (config, server) = fake_builder("05:03:41|13:35:12|22:06:44\n").await;
        let client = WireClient::new(config);
        assert_eq!(client.state(), FetchState::Idle);

        let request = Request::new("SOLAR", vec!["2019-06-21|53.5|-113.5|-6".into()], Completion::arity(3));
        let first = client.send(request.clone()).unwrap();
        assert_eq!(client.state(), FetchState::InFlight);
        assert!(matches!(
            client.send(request),
            Err(ClientError::ConcurrentRequest)
        ));
        assert_eq!(client.state(), FetchState::InFlight);

        let response = first.await.unwrap();
        assert_eq!(response.body, "05:03:41|13:35:12|22:06:44\n");
        assert_eq!(client.state(), FetchState::Completed);
        assert_eq!(
            server.await.unwrap(),
            "STARTUP\nSOLAR\n2019-06-21|53.5|-113.5|-6\nSHUTDOWN\n"
        );
    }

    #[tokio::test]
    async fn test_connect_failure_marks_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = WireClient::new(ServerConfig::new("127.0.0.1", port));
        let pending = client
            .send(Request::new("LISTFUELS", Vec::new(), Completion::FirstChunk))
            .unwrap();
        assert!(matches!(pending.await, Err(ClientError::Io(_))));
        assert_eq!(client.state(), FetchState::Failed);
    }

    #[tokio::test]
    async fn test_send_with_invokes_callback_once() {
        let (config, _server) = fake_builder("job_20190101\n").await;
        let client = WireClient::new(config);
        let (tx, rx) = oneshot::channel();
        let handle = client
            .send_with(
                Request::new("BEGINDATA", Vec::new(), Completion::FirstChunk),
                move |result| {
                    let _ = tx.send(result.map(|response| response.body));
                },
            )
            .unwrap();
        handle.await.unwrap();
        assert_eq!(rx.await.unwrap().unwrap(), "job_20190101\n");
        assert_eq!(client.state(), FetchState::Completed);
    }

    #[test]
    fn test_request_from_calculation() {
        let request = Request::calculation(&calc::fuels::ListFuels);
        assert_eq!(request.command, "LISTFUELS");
        assert_eq!(request.completion, Completion::Sentinel("COMPLETE"));
        assert!(request.lines.is_empty());
    }
}
