//! Synchronous HTTP client over the wrapped asynchronous engine
//!
//! [`Client`] issues one blocking round-trip per call against a fixed base
//! endpoint and, when enabled, replays a cookie jar across calls. All
//! pooling, TLS, timeout and redirect behavior is the engine's own; this
//! layer only builds the request, waits for completion and keeps the jar.

use std::time::Duration;

use reqwest::header::{self, HeaderMap};
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use tokio::runtime;

use crate::cookie::{Cookie, CookieJar};
use crate::error::{ClientError, Result};
use crate::method::Method;

/// A single named part attached to an outgoing request as a multipart body
#[derive(Debug)]
pub struct BodyPart {
    name: String,
    part: Part,
}

impl BodyPart {
    /// Wrap an engine part under the given form-field name
    pub fn new(name: impl Into<String>, part: Part) -> Self {
        Self {
            name: name.into(),
            part,
        }
    }

    /// A plain text part
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Part::text(value.into()))
    }

    /// A raw byte part
    pub fn bytes(name: impl Into<String>, value: Vec<u8>) -> Self {
        Self::new(name, Part::bytes(value))
    }
}

/// Client to use other REST services, including the ones a Gantry server
/// exposes
///
/// Every call is a single blocking round-trip: the request future is driven
/// to completion on a runtime the client owns. The cookie jar is plain
/// mutable state, so the verb methods take `&mut self`; sharing one client
/// across threads requires wrapping it in a `Mutex` (or giving each thread
/// its own client).
#[derive(Debug)]
pub struct Client {
    endpoint: String,
    use_cookies: bool,
    cookies: CookieJar,
    engine: reqwest::Client,
    runtime: runtime::Runtime,
}

impl Client {
    /// Make a client for `endpoint` with the cookie jar enabled
    ///
    /// `endpoint` is the absolute base URL every request path is appended
    /// to. It is stored verbatim; no trailing-slash normalization happens.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_options(endpoint, true)
    }

    /// Make a client with explicit cookie-jar behavior
    pub fn with_options(endpoint: impl Into<String>, use_cookies: bool) -> Result<Self> {
        let engine = reqwest::Client::builder()
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()?;
        Self::with_engine(endpoint, use_cookies, engine)
    }

    /// Make a client around an externally supplied engine
    pub fn with_engine(
        endpoint: impl Into<String>,
        use_cookies: bool,
        engine: reqwest::Client,
    ) -> Result<Self> {
        let runtime = runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            use_cookies,
            cookies: CookieJar::new(),
            engine,
            runtime,
        })
    }

    /// Base endpoint all request paths are appended to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the cookie jar is in use
    pub const fn use_cookies(&self) -> bool {
        self.use_cookies
    }

    /// Cookies currently held in the jar
    pub const fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Mutable access to the jar, for seeding or clearing cookies
    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// Synchronous execution of one round-trip
    ///
    /// `url` is appended verbatim to the endpoint; an empty `url` stands
    /// for the default path `/`. When present, `body` is attached as a
    /// single multipart part. With cookies enabled, every jar entry rides
    /// on the request, and afterwards each response cookie updates the
    /// jar: an empty value with path `/` removes the same-named entry,
    /// anything else is upserted.
    pub fn send(
        &mut self,
        method: Method,
        url: &str,
        body: Option<BodyPart>,
    ) -> Result<ClientResponse> {
        let path = if url.is_empty() { "/" } else { url };
        let target = format!("{}{}", self.endpoint, path);

        let mut request = self.engine.request(method.into(), target.as_str());

        if let Some(part) = body {
            request = request.multipart(Form::new().part(part.name, part.part));
        }

        if self.use_cookies && !self.cookies.is_empty() {
            request = request.header(header::COOKIE, self.cookies.header_value());
        }

        log::debug!("{method} {target}");

        // Wait-for-completion bridge: the send future runs as a task on
        // the owned runtime. A task that dies without handing back a
        // response is the one failure this layer raises itself.
        let pending = self.runtime.spawn(request.send());
        let response = self.runtime.block_on(async {
            let raw = pending.await.map_err(|_| ClientError::NullResponse)??;
            ClientResponse::drain(raw).await
        })?;

        if self.use_cookies {
            for cookie in response.cookies() {
                self.cookies.store(cookie.clone());
            }
        }

        log::debug!("{method} {target} -> {}", response.status());

        Ok(response)
    }

    /// `send` with the GET verb
    pub fn get(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Get, url, body)
    }

    /// `send` with the HEAD verb
    pub fn head(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Head, url, body)
    }

    /// `send` with the POST verb
    pub fn post(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Post, url, body)
    }

    /// `send` with the PUT verb
    pub fn put(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Put, url, body)
    }

    /// `send` with the DELETE verb
    pub fn delete(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Delete, url, body)
    }

    /// `send` with the TRACE verb
    pub fn trace(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Trace, url, body)
    }

    /// `send` with the OPTIONS verb
    pub fn options(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Options, url, body)
    }

    /// `send` with the PATCH verb
    pub fn patch(&mut self, url: &str, body: Option<BodyPart>) -> Result<ClientResponse> {
        self.send(Method::Patch, url, body)
    }
}

/// Buffered reply from one round-trip
///
/// The engine's response is drained eagerly so a synchronous caller never
/// has to touch the async body readers.
#[derive(Debug, Clone)]
pub struct ClientResponse {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Vec<u8>,
}

impl ClientResponse {
    async fn drain(raw: reqwest::Response) -> Result<Self> {
        let url = raw.url().clone();
        let status = raw.status();
        let headers = raw.headers().clone();
        let cookies = raw.cookies().map(Cookie::from).collect();
        let body = raw.bytes().await?.to_vec();
        Ok(Self {
            url,
            status,
            headers,
            cookies,
            body,
        })
    }

    /// Final URL of the request
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP status of the reply
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Cookies the server set on this reply
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    /// One request as seen by the scripted server
    struct Received {
        method: String,
        path: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl Received {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Build a scripted reply: status line tail plus optional extra
    /// headers, with a correctly framed body
    fn page(head: &str, body: &str) -> String {
        format!(
            "{head}\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
    }

    fn ok() -> String {
        page("200 OK", "")
    }

    /// Serve one scripted reply per sequential connection on a loopback
    /// port, reporting every request that arrives
    fn serve(replies: Vec<String>) -> (String, mpsc::Receiver<Received>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for reply in replies {
                let (stream, _) = listener.accept().unwrap();
                handle(stream, &reply, &tx);
            }
        });
        (format!("http://127.0.0.1:{port}"), rx)
    }

    fn handle(mut stream: TcpStream, reply: &str, tx: &mpsc::Sender<Received>) {
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap().to_string();
        let path = parts.next().unwrap().to_string();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        let body = read_body(&mut reader, &headers);
        let _ = tx.send(Received {
            method,
            path,
            headers,
            body,
        });

        let response = format!("HTTP/1.1 {reply}");
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
    }

    fn read_body(
        reader: &mut BufReader<TcpStream>,
        headers: &[(String, String)],
    ) -> Vec<u8> {
        let content_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .and_then(|(_, value)| value.parse::<usize>().ok());

        if let Some(length) = content_length {
            let mut body = vec![0_u8; length];
            reader.read_exact(&mut body).unwrap();
            return body;
        }

        let chunked = headers
            .iter()
            .any(|(name, value)| name == "transfer-encoding" && value.contains("chunked"));
        if !chunked {
            return Vec::new();
        }

        let mut body = Vec::new();
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).unwrap();
            let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);
            if size == 0 {
                let mut trailer = String::new();
                let _ = reader.read_line(&mut trailer);
                break;
            }
            let mut chunk = vec![0_u8; size + 2];
            reader.read_exact(&mut chunk).unwrap();
            chunk.truncate(size);
            body.extend_from_slice(&chunk);
        }
        body
    }

    #[test]
    fn send_dispatches_each_verb() {
        let (endpoint, rx) = serve(vec![ok(); 8]);
        let mut client = Client::new(endpoint).unwrap();

        for method in Method::ALL {
            client.send(method, "/", None).unwrap();
        }

        let seen: Vec<String> = (0..8).map(|_| rx.recv().unwrap().method).collect();
        let expected: Vec<&str> = Method::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn convenience_methods_match_send() {
        let (endpoint, rx) = serve(vec![ok(); 8]);
        let mut client = Client::new(endpoint).unwrap();

        client.get("/", None).unwrap();
        client.head("/", None).unwrap();
        client.post("/", None).unwrap();
        client.put("/", None).unwrap();
        client.delete("/", None).unwrap();
        client.trace("/", None).unwrap();
        client.options("/", None).unwrap();
        client.patch("/", None).unwrap();

        for method in Method::ALL {
            let received = rx.recv().unwrap();
            assert_eq!(received.method, method.as_str());
            assert_eq!(received.path, "/");
        }
    }

    #[test]
    fn empty_path_defaults_to_root() {
        let (endpoint, rx) = serve(vec![ok(), ok()]);
        let mut client = Client::new(endpoint).unwrap();

        client.get("", None).unwrap();
        client.get("/status", None).unwrap();

        assert_eq!(rx.recv().unwrap().path, "/");
        assert_eq!(rx.recv().unwrap().path, "/status");
    }

    #[test]
    fn response_exposes_status_headers_and_body() {
        let (endpoint, _rx) = serve(vec![page(
            "418 I'm a teapot\r\nX-Flavor: earl-grey",
            "short and stout",
        )]);
        let mut client = Client::new(endpoint).unwrap();

        let response = client.get("/teapot", None).unwrap();
        assert_eq!(response.status().as_u16(), 418);
        assert_eq!(response.headers().get("x-flavor").unwrap(), "earl-grey");
        assert_eq!(response.text(), "short and stout");
    }

    #[test]
    fn response_cookies_are_stored_and_replayed() {
        let (endpoint, rx) = serve(vec![
            page("200 OK\r\nSet-Cookie: session=abc123; Path=/x", ""),
            ok(),
        ]);
        let mut client = Client::new(endpoint).unwrap();

        let first = client.get("/", None).unwrap();
        assert_eq!(first.cookies().len(), 1);
        assert_eq!(client.cookies().get("session").unwrap().value, "abc123");
        assert_eq!(
            client.cookies().get("session").unwrap().path.as_deref(),
            Some("/x")
        );

        client.get("/", None).unwrap();
        let _ = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert_eq!(second.header("cookie"), Some("session=abc123"));
    }

    #[test]
    fn deletion_marker_clears_the_jar_entry() {
        let (endpoint, _rx) = serve(vec![
            page("200 OK\r\nSet-Cookie: session=abc123; Path=/x", ""),
            page("200 OK\r\nSet-Cookie: session=; Path=/", ""),
        ]);
        let mut client = Client::new(endpoint).unwrap();

        client.get("/", None).unwrap();
        assert_eq!(client.cookies().len(), 1);

        client.get("/", None).unwrap();
        assert!(client.cookies().is_empty());
    }

    #[test]
    fn empty_value_off_root_path_is_upserted() {
        let (endpoint, _rx) = serve(vec![page("200 OK\r\nSet-Cookie: flag=; Path=/x", "")]);
        let mut client = Client::new(endpoint).unwrap();

        client.get("/", None).unwrap();
        assert_eq!(client.cookies().get("flag").unwrap().value, "");
    }

    #[test]
    fn disabled_jar_neither_sends_nor_absorbs_cookies() {
        let (endpoint, rx) = serve(vec![
            page("200 OK\r\nSet-Cookie: session=abc123; Path=/", ""),
            ok(),
        ]);
        let mut client = Client::with_options(endpoint, false).unwrap();
        client
            .cookies_mut()
            .store(Cookie::new("seeded", "value"));

        client.get("/", None).unwrap();
        assert!(client.cookies().get("session").is_none());

        client.get("/", None).unwrap();
        let _ = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert_eq!(second.header("cookie"), None);
    }

    #[test]
    fn multipart_body_rides_as_a_single_named_part() {
        let (endpoint, rx) = serve(vec![ok()]);
        let mut client = Client::new(endpoint).unwrap();

        client
            .post("/upload", Some(BodyPart::text("greeting", "hello")))
            .unwrap();

        let received = rx.recv().unwrap();
        let content_type = received.header("content-type").unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&received.body);
        assert!(body.contains("name=\"greeting\""));
        assert!(body.contains("hello"));
    }

    #[test]
    fn transport_failure_surfaces_for_every_verb() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut client = Client::new(format!("http://127.0.0.1:{port}")).unwrap();
        for method in Method::ALL {
            assert!(client.send(method, "/", None).is_err());
        }
    }

    #[test]
    fn endpoint_is_stored_verbatim() {
        let client = Client::new("http://example.test:9").unwrap();
        assert_eq!(client.endpoint(), "http://example.test:9");
        assert!(client.use_cookies());
    }
}
