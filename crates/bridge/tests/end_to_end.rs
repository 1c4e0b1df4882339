//! End-to-end scenarios through the public surface: a hand-rolled in-memory
//! engine drives the bridge exactly the way a real engine would — translate,
//! call, assemble, deliver — and the tests assert on the raw bytes.

use micro_bridge::app::body::{ChunkedBody, FileBody};
use micro_bridge::app::ResponseTriple;
use micro_bridge::engine::{EngineHandler, NativeRequest, NativeResponse, ServerEngine};
use micro_bridge::environ::{key, Environment};
use micro_bridge::response::{deliver, BodyVariant};
use micro_bridge::server::{ListenConfig, ServerOptions};
use micro_bridge::{start_with, Bridge, HijackHandler};
use std::io;
use std::io::{Read, Write};

struct TestRequest {
    meta: Vec<(String, Option<String>)>,
    path: String,
    body: Vec<u8>,
}

impl TestRequest {
    fn get(path: &str) -> Self {
        Self {
            meta: vec![
                ("REQUEST_METHOD".to_owned(), Some("GET".to_owned())),
                ("SERVER_PROTOCOL".to_owned(), Some("HTTP/1.1".to_owned())),
                ("SCRIPT_NAME".to_owned(), Some(String::new())),
            ],
            path: path.to_owned(),
            body: Vec::new(),
        }
    }

    fn with_meta(mut self, name: &str, value: &str) -> Self {
        self.meta.push((name.to_owned(), Some(value.to_owned())));
        self
    }
}

impl NativeRequest for TestRequest {
    fn meta_vars(&self) -> Vec<(String, Option<String>)> {
        self.meta.clone()
    }

    fn uri_path(&self) -> &str {
        &self.path
    }

    fn take_body(&mut self) -> Box<dyn Read + Send> {
        Box::new(io::Cursor::new(std::mem::take(&mut self.body)))
    }
}

#[derive(Default)]
struct TestResponse {
    status: u16,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
    auto_chunking: bool,
    body: Option<BodyVariant>,
}

impl TestResponse {
    fn new() -> Self {
        Self { auto_chunking: true, ..Self::default() }
    }
}

impl NativeResponse for TestResponse {
    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn set_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.headers.push((name.to_owned(), value.to_owned()));
        Ok(())
    }

    fn append_cookie(&mut self, cookie: &str) {
        self.cookies.push(cookie.to_owned());
    }

    fn set_auto_chunking(&mut self, enabled: bool) {
        self.auto_chunking = enabled;
    }

    fn auto_chunking(&self) -> bool {
        self.auto_chunking
    }

    fn set_body(&mut self, body: BodyVariant) {
        self.body = Some(body);
    }

    fn take_body(&mut self) -> Option<BodyVariant> {
        self.body.take()
    }

    fn write_preamble(&mut self, sink: &mut dyn Write) -> io::Result<()> {
        write!(sink, "HTTP/1.1 {}\r\n", self.status)?;
        for (name, value) in &self.headers {
            write!(sink, "{name}: {value}\r\n")?;
        }
        for cookie in &self.cookies {
            write!(sink, "set-cookie: {cookie}\r\n")?;
        }
        if self.auto_chunking {
            sink.write_all(b"transfer-encoding: chunked\r\n")?;
        }
        sink.write_all(b"\r\n")
    }
}

/// Run one request through the full adapter path and return the wire bytes
/// plus the response object for header/cookie inspection.
fn roundtrip<A>(app: A, mut req: TestRequest) -> (Vec<u8>, TestResponse)
where
    A: Fn(Environment) -> ResponseTriple + Send + Sync,
{
    let bridge = Bridge::new(app);
    let mut res = TestResponse::new();
    let options = bridge.handle(&mut req, &mut res).unwrap();

    let mut wire = Vec::new();
    deliver(&mut res, &mut wire, options).unwrap();
    (wire, res)
}

#[test]
fn plain_text_response() {
    let (wire, res) = roundtrip(
        |_env| {
            ResponseTriple::new(200)
                .header("content-type", "text/plain")
                .header("content-length", "5")
                .body(ChunkedBody::from("hello"))
        },
        TestRequest::get("/"),
    );

    let text = String::from_utf8(wire).unwrap();
    assert!(text.starts_with("HTTP/1.1 200\r\n"));
    assert!(text.contains("content-type: text/plain\r\n"));
    assert!(text.ends_with("\r\n\r\nhello"));
    assert_eq!(res.status, 200);
    assert_eq!(res.headers.len(), 2);
}

#[test]
fn cookies_get_their_own_entries() {
    let (_wire, res) = roundtrip(
        |_env| {
            ResponseTriple::new(200)
                .header("set-cookie", "a=1\nb=2")
                .body(ChunkedBody::new())
        },
        TestRequest::get("/"),
    );

    assert_eq!(res.cookies, ["a=1", "b=2"]);
    assert!(res.headers.is_empty());
}

#[test]
fn scheme_follows_https_indicator() {
    let echo_scheme = |env: Environment| {
        let scheme = env.str_var(key::URL_SCHEME).unwrap_or("?").to_owned();
        ResponseTriple::new(200).body(ChunkedBody::from(scheme))
    };

    let (wire, _res) = roundtrip(echo_scheme, TestRequest::get("/").with_meta("HTTPS", "on"));
    assert!(String::from_utf8(wire).unwrap().ends_with("https"));

    let (wire, _res) = roundtrip(echo_scheme, TestRequest::get("/").with_meta("HTTPS", "no"));
    assert!(String::from_utf8(wire).unwrap().ends_with("\r\nhttp"));

    let (wire, _res) = roundtrip(echo_scheme, TestRequest::get("/"));
    assert!(String::from_utf8(wire).unwrap().ends_with("\r\nhttp"));
}

#[test]
fn request_body_reaches_the_application() {
    let mut req = TestRequest::get("/upload");
    req.body = b"payload bytes".to_vec();

    let (wire, _res) = roundtrip(
        |mut env: Environment| {
            let mut body = String::new();
            env.input().read_to_string(&mut body).unwrap();
            ResponseTriple::new(200).body(ChunkedBody::from(format!("got: {body}")))
        },
        req,
    );

    assert!(String::from_utf8(wire).unwrap().ends_with("got: payload bytes"));
}

#[test]
fn hijack_owns_the_whole_wire() {
    let (wire, _res) = roundtrip(
        |_env| {
            ResponseTriple::new(200)
                .header("content-type", "text/plain")
                .hijack(HijackHandler::new(|sink| {
                    sink.write_all(b"HTTP/1.1 204 No Content\r\n\r\n")
                }))
                .body(ChunkedBody::from("ignored"))
        },
        TestRequest::get("/"),
    );

    // Nothing but the handler's bytes: assembled status and headers are gone.
    assert_eq!(wire, b"HTTP/1.1 204 No Content\r\n\r\n");
}

#[test]
fn file_body_streams_from_disk() {
    let mut payload = tempfile::NamedTempFile::new().unwrap();
    payload.write_all(b"static file contents").unwrap();
    let path = payload.path().to_path_buf();

    let (wire, _res) = roundtrip(
        move |_env| {
            ResponseTriple::new(200)
                .header("content-type", "application/octet-stream")
                .body(FileBody::new(&path))
        },
        TestRequest::get("/download"),
    );

    assert!(String::from_utf8(wire).unwrap().ends_with("static file contents"));
}

#[test]
fn application_framed_chunking_overrides_the_engine() {
    let (wire, res) = roundtrip(
        |_env| {
            ResponseTriple::new(200)
                .header("transfer-encoding", "chunked")
                .body(ChunkedBody::from("5\r\nhello\r\n0\r\n\r\n"))
        },
        TestRequest::get("/"),
    );

    let text = String::from_utf8(wire).unwrap();
    // Exactly one transfer-encoding line — the application's. The engine's
    // framing switch is back on afterwards for the connection's sake.
    assert_eq!(text.matches("transfer-encoding").count(), 1);
    assert!(text.ends_with("5\r\nhello\r\n0\r\n\r\n"));
    assert!(res.auto_chunking);
}

#[test]
fn full_hijack_is_a_structured_refusal() {
    let (_wire, res) = roundtrip(
        |env: Environment| {
            assert_eq!(env.bool_var(key::IS_HIJACK), Some(true));
            assert!(env.hijack().io().is_none());
            match env.hijack().full() {
                Err(e) => ResponseTriple::new(501).body(ChunkedBody::from(e.to_string())),
                Ok(_) => ResponseTriple::new(500),
            }
        },
        TestRequest::get("/"),
    );

    assert_eq!(res.status, 501);
}

// Lifecycle: a minimal engine that serves its canned requests when run.

struct InMemoryEngine {
    handler: Option<EngineHandler<Self>>,
    pending: Vec<TestRequest>,
    wire: Vec<Vec<u8>>,
    down: bool,
}

impl ServerEngine for InMemoryEngine {
    type Request = TestRequest;
    type Response = TestResponse;

    fn bind(config: &ListenConfig) -> io::Result<Self> {
        assert!(config.port > 0);
        Ok(Self { handler: None, pending: Vec::new(), wire: Vec::new(), down: false })
    }

    fn mount(&mut self, handler: EngineHandler<Self>) {
        self.handler = Some(handler);
    }

    fn run(&mut self) -> io::Result<()> {
        let handler = self.handler.take().expect("no handler mounted");
        for mut req in self.pending.drain(..) {
            let mut res = TestResponse::new();
            let options = handler(&mut req, &mut res)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

            let mut out = Vec::new();
            deliver(&mut res, &mut out, options)?;
            self.wire.push(out);
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.down = true;
    }
}

#[test]
fn lifecycle_serves_and_shuts_down() {
    let mut handle = start_with(
        |env: Environment| {
            let path = env.str_var(key::PATH_INFO).unwrap_or("?").to_owned();
            ResponseTriple::new(200).body(ChunkedBody::from(path))
        },
        ServerOptions::new().port(8080),
        |engine: &mut InMemoryEngine| {
            engine.pending.push(TestRequest::get("/first"));
            engine.pending.push(TestRequest::get("/second"));
        },
    )
    .unwrap();

    handle.run().unwrap();

    {
        let engine = handle.engine_mut().unwrap();
        assert_eq!(engine.wire.len(), 2);
        assert!(String::from_utf8(engine.wire[0].clone()).unwrap().ends_with("/first"));
        assert!(String::from_utf8(engine.wire[1].clone()).unwrap().ends_with("/second"));
        assert!(!engine.down);
    }

    handle.shutdown();
    assert!(handle.engine_mut().is_none());
}
