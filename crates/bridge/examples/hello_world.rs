//! A complete round trip through the adapter with a toy in-memory engine:
//! one canned GET request goes in, the raw response bytes come out on
//! stdout. Swap `DemoRequest`/`DemoResponse` for a real engine's objects and
//! nothing else changes.

use micro_bridge::app::body::ChunkedBody;
use micro_bridge::app::ResponseTriple;
use micro_bridge::engine::{NativeRequest, NativeResponse};
use micro_bridge::environ::{key, Environment};
use micro_bridge::response::{deliver, BodyVariant};
use micro_bridge::Bridge;
use std::io;
use std::io::{Read, Write};

fn app(env: Environment) -> ResponseTriple {
    let who = env.str_var(key::PATH_INFO).unwrap_or("/world").to_owned();
    let body = format!("hello from {who}\n");
    ResponseTriple::new(200)
        .header("content-type", "text/plain")
        .header("content-length", body.len().to_string())
        .body(ChunkedBody::from(body))
}

struct DemoRequest;

impl NativeRequest for DemoRequest {
    fn meta_vars(&self) -> Vec<(String, Option<String>)> {
        vec![
            ("REQUEST_METHOD".to_owned(), Some("GET".to_owned())),
            ("SERVER_PROTOCOL".to_owned(), Some("HTTP/1.1".to_owned())),
            ("SCRIPT_NAME".to_owned(), Some(String::new())),
        ]
    }

    fn uri_path(&self) -> &str {
        "/rust"
    }

    fn take_body(&mut self) -> Box<dyn Read + Send> {
        Box::new(io::empty())
    }
}

#[derive(Default)]
struct DemoResponse {
    status: u16,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
    auto_chunking: bool,
    body: Option<BodyVariant>,
}

impl NativeResponse for DemoResponse {
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
        sink.write_all(b"\r\n")
    }
}

fn main() -> io::Result<()> {
    let bridge = Bridge::new(app);

    let mut req = DemoRequest;
    let mut res = DemoResponse::default();
    let options = bridge
        .handle(&mut req, &mut res)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let stdout = io::stdout();
    let mut sink = stdout.lock();
    deliver(&mut res, &mut sink, options)
}
