//! Direct transport: dial the resolved address, handshake, speak HTTP/1.1 or HTTP/2.
//!
//! Every phase emits trace events, so timing through this path is precise.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::{http1, http2};
use hyper::header::{HeaderName, HeaderValue, HOST};
use hyper::{Method, Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use log::debug;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tokio_rustls::TlsConnector;

use super::target::DialTarget;
use super::TransportResponse;
use crate::config::{TRACE_CONNECT_TCP, TRACE_START_TLS};
use crate::error_handling::HttpClientError;
use crate::timing::{TimingCollector, TraceCollector};
use crate::tls::{live_tls_info, LiveTlsInfo};

/// Everything the direct transport needs for one request.
pub(crate) struct DirectRequest<'a> {
    pub target: &'a DialTarget,
    /// Original URL; its authority becomes `:authority` on HTTP/2
    pub url: &'a str,
    pub method: Method,
    pub headers: &'a [(String, String)],
    pub body: Bytes,
    /// `Some` for HTTPS
    pub tls: Option<Arc<ClientConfig>>,
    pub deadline: Instant,
}

trait Io: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> Io for T {}

/// Stand-in for "no deadline" when `now + timeout` is past the clock's range.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Attempt deadline `timeout` from now, saturating instead of overflowing.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Runs `fut` until the attempt deadline.
async fn within<F: Future>(
    deadline: Instant,
    phase: &str,
    fut: F,
) -> Result<F::Output, HttpClientError> {
    timeout_at(deadline, fut)
        .await
        .map_err(|_| HttpClientError::Timeout(format!("{phase} did not finish before the deadline")))
}

/// Sends one request on a fresh connection and consumes the body.
///
/// Marks TTFB when headers arrive and request-end after the last body frame.
pub(crate) async fn send_direct(
    req: DirectRequest<'_>,
    collector: &mut dyn TimingCollector,
    trace: &mut TraceCollector,
) -> Result<TransportResponse, HttpClientError> {
    let deadline = req.deadline;
    let addr = req.target.socket_addr;
    debug!(
        "Dialing {} (Host: {}, SNI: {})",
        req.target.dial_url, req.target.host_header, req.target.sni_hostname
    );

    trace.record(TRACE_CONNECT_TCP, "started");
    let tcp = within(deadline, "connect", TcpStream::connect(addr))
        .await?
        .map_err(|e| HttpClientError::RequestFailed(format!("connect to {addr}: {e}")))?;
    trace.record(TRACE_CONNECT_TCP, "complete");
    let _ = tcp.set_nodelay(true);

    let (io, live_tls): (Box<dyn Io>, Option<LiveTlsInfo>) = match &req.tls {
        Some(config) => {
            let server_name = ServerName::try_from(req.target.sni_hostname.clone())
                .map_err(|e| HttpClientError::InvalidRequest(format!("server name: {e}")))?;
            let connector = TlsConnector::from(Arc::clone(config));

            trace.record(TRACE_START_TLS, "started");
            let stream = within(deadline, "TLS handshake", connector.connect(server_name, tcp))
                .await?
                .map_err(|e| HttpClientError::RequestFailed(format!("TLS handshake: {e}")))?;
            trace.record(TRACE_START_TLS, "complete");

            let live = live_tls_info(stream.get_ref().1);
            (Box::new(stream) as Box<dyn Io>, Some(live))
        }
        None => (Box::new(tcp) as Box<dyn Io>, None),
    };

    let use_h2 = live_tls
        .as_ref()
        .and_then(|live| live.alpn.as_deref())
        .is_some_and(|alpn| alpn == "h2");
    let request = build_request(&req, use_h2)?;
    let io = TokioIo::new(io);

    let response = if use_h2 {
        let (mut sender, conn) = within(
            deadline,
            "HTTP/2 handshake",
            http2::handshake(TokioExecutor::new(), io),
        )
        .await?
        .map_err(|e| HttpClientError::RequestFailed(format!("HTTP/2 handshake: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("HTTP/2 connection closed: {e}");
            }
        });
        send(deadline, sender.send_request(request)).await?
    } else {
        let (mut sender, conn) = within(deadline, "HTTP/1.1 handshake", http1::handshake(io))
            .await?
            .map_err(|e| HttpClientError::RequestFailed(format!("HTTP/1.1 handshake: {e}")))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!("HTTP/1.1 connection closed: {e}");
            }
        });
        send(deadline, sender.send_request(request)).await?
    };
    collector.mark_ttfb();

    let (parts, mut body) = response.into_parts();
    let mut body_bytes: u64 = 0;
    while let Some(frame) = within(deadline, "response body", body.frame()).await? {
        let frame =
            frame.map_err(|e| HttpClientError::RequestFailed(format!("reading body: {e}")))?;
        if let Some(data) = frame.data_ref() {
            body_bytes += data.len() as u64;
        }
    }
    collector.mark_request_end();

    Ok(TransportResponse {
        status: parts.status.as_u16(),
        headers: parts.headers,
        version: format!("{:?}", parts.version),
        body_bytes,
        live_tls,
    })
}

async fn send<F>(deadline: Instant, fut: F) -> Result<Response<hyper::body::Incoming>, HttpClientError>
where
    F: Future<Output = Result<Response<hyper::body::Incoming>, hyper::Error>>,
{
    within(deadline, "response headers", fut)
        .await?
        .map_err(|e| HttpClientError::RequestFailed(e.to_string()))
}

/// HTTP/1.1 gets an origin-form target plus `Host`; HTTP/2 gets the absolute
/// URL so `:authority` carries the hostname.
fn build_request(req: &DirectRequest<'_>, use_h2: bool) -> Result<Request<Full<Bytes>>, HttpClientError> {
    let mut builder = Request::builder().method(req.method.clone());
    builder = if use_h2 {
        builder.uri(req.url).version(hyper::Version::HTTP_2)
    } else {
        builder
            .uri(req.target.origin_form.as_str())
            .header(HOST, req.target.host_header.as_str())
    };

    for (name, value) in req.headers {
        if name.eq_ignore_ascii_case(HOST.as_str()) {
            continue;
        }
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpClientError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HttpClientError::InvalidRequest(format!("header {name}: {e}")))?;
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(req.body.clone()))
        .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))
}
