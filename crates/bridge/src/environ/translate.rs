//! Request translation: engine-native request object → normalized environment.
//!
//! Best effort by contract: absent or malformed metadata is defaulted, never
//! rejected, so this path raises no errors at all.

use super::{EnvValue, Environment, ErrorSink, HijackSupport, PROTOCOL_VERSION, key};
use crate::engine::NativeRequest;

impl Environment {
    /// Build the environment for one request.
    ///
    /// Copies the engine's metadata (dropping valueless entries), asserts the
    /// protocol-identification and concurrency-model keys, then computes the
    /// derived keys: URL scheme, HTTP version, query string, `PATH_INFO` and
    /// `REQUEST_PATH`.
    ///
    /// Two details carry weight:
    ///
    /// - `PATH_INFO` pre-set to the empty string is preserved untouched. That
    ///   sentinel is the escape hatch for engines that already resolved the
    ///   path; every other value is recomputed as the URI path with the
    ///   `SCRIPT_NAME` prefix skipped.
    /// - the scheme is `https` only on an exact `HTTPS` indicator match of
    ///   `yes`, `on` or `1`.
    pub fn from_request<R: NativeRequest + ?Sized>(req: &mut R) -> Self {
        let mut env = Self {
            vars: req
                .meta_vars()
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, EnvValue::Str(v))))
                .collect(),
            input: req.take_body(),
            errors: ErrorSink::new(),
            hijack: HijackSupport::new(),
        };

        env.insert(key::VERSION, PROTOCOL_VERSION);
        env.insert(key::MULTITHREAD, true);
        env.insert(key::MULTIPROCESS, false);
        env.insert(key::RUN_ONCE, false);
        env.insert(key::IS_HIJACK, true);

        let scheme = match env.str_var(key::HTTPS) {
            Some("yes" | "on" | "1") => "https",
            _ => "http",
        };
        env.insert(key::URL_SCHEME, scheme);

        if env.str_var(key::SERVER_PROTOCOL).is_none() {
            env.insert(key::SERVER_PROTOCOL, "HTTP/1.1");
        }
        if env.str_var(key::HTTP_VERSION).is_none() {
            let protocol = env.str_var(key::SERVER_PROTOCOL).unwrap_or("HTTP/1.1").to_owned();
            env.insert(key::HTTP_VERSION, protocol);
        }

        if env.str_var(key::QUERY_STRING).is_none() {
            env.insert(key::QUERY_STRING, "");
        }
        if env.str_var(key::SCRIPT_NAME).is_none() {
            env.insert(key::SCRIPT_NAME, "");
        }

        // The empty string is a sentinel left by engines that pre-resolved
        // the path; anything else gets recomputed from the URI.
        if env.str_var(key::PATH_INFO) != Some("") {
            let skip = env.str_var(key::SCRIPT_NAME).map_or(0, str::len);
            let path_info = req.uri_path().get(skip..).unwrap_or("").to_owned();
            env.insert(key::PATH_INFO, path_info);
        }

        if env.str_var(key::REQUEST_PATH).is_none() {
            let request_path = format!(
                "{}{}",
                env.str_var(key::SCRIPT_NAME).unwrap_or(""),
                env.str_var(key::PATH_INFO).unwrap_or("")
            );
            env.insert(key::REQUEST_PATH, request_path);
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::io::Read;

    struct FakeRequest {
        meta: Vec<(String, Option<String>)>,
        path: String,
        body: &'static [u8],
    }

    impl FakeRequest {
        fn new(path: &str, meta: &[(&str, Option<&str>)]) -> Self {
            Self {
                meta: meta
                    .iter()
                    .map(|(k, v)| ((*k).to_owned(), v.map(str::to_owned)))
                    .collect(),
                path: path.to_owned(),
                body: b"",
            }
        }
    }

    impl NativeRequest for FakeRequest {
        fn meta_vars(&self) -> Vec<(String, Option<String>)> {
            self.meta.clone()
        }

        fn uri_path(&self) -> &str {
            &self.path
        }

        fn take_body(&mut self) -> Box<dyn Read + Send> {
            Box::new(io::Cursor::new(self.body))
        }
    }

    #[test]
    fn test_null_metadata_is_stripped() {
        let mut req = FakeRequest::new(
            "/",
            &[("REMOTE_HOST", None), ("REMOTE_ADDR", Some("127.0.0.1"))],
        );
        let env = Environment::from_request(&mut req);

        assert!(env.get("REMOTE_HOST").is_none());
        assert_eq!(env.str_var("REMOTE_ADDR"), Some("127.0.0.1"));
    }

    #[test]
    fn test_required_keys_are_defaulted() {
        let mut req = FakeRequest::new("/", &[]);
        let env = Environment::from_request(&mut req);

        assert_eq!(env.str_var(key::VERSION), Some(PROTOCOL_VERSION));
        assert_eq!(env.str_var(key::HTTP_VERSION), Some("HTTP/1.1"));
        assert_eq!(env.str_var(key::QUERY_STRING), Some(""));
        assert_eq!(env.str_var(key::SCRIPT_NAME), Some(""));
        assert_eq!(env.bool_var(key::MULTITHREAD), Some(true));
        assert_eq!(env.bool_var(key::MULTIPROCESS), Some(false));
        assert_eq!(env.bool_var(key::RUN_ONCE), Some(false));
        assert_eq!(env.bool_var(key::IS_HIJACK), Some(true));
    }

    #[test]
    fn test_http_version_follows_server_protocol() {
        let mut req = FakeRequest::new("/", &[("SERVER_PROTOCOL", Some("HTTP/1.0"))]);
        let env = Environment::from_request(&mut req);

        assert_eq!(env.str_var(key::HTTP_VERSION), Some("HTTP/1.0"));
    }

    #[test]
    fn test_url_scheme_indicator() {
        for (indicator, scheme) in [
            (Some("on"), "https"),
            (Some("yes"), "https"),
            (Some("1"), "https"),
            (Some("no"), "http"),
            (Some("ON"), "http"),
            (None, "http"),
        ] {
            let mut req = FakeRequest::new("/", &[("HTTPS", indicator)]);
            let env = Environment::from_request(&mut req);
            assert_eq!(env.str_var(key::URL_SCHEME), Some(scheme), "indicator {indicator:?}");
        }
    }

    #[test]
    fn test_path_info_skips_script_name() {
        let mut req = FakeRequest::new("/app/users/1", &[("SCRIPT_NAME", Some("/app"))]);
        let env = Environment::from_request(&mut req);

        assert_eq!(env.str_var(key::PATH_INFO), Some("/users/1"));
        assert_eq!(env.str_var(key::REQUEST_PATH), Some("/app/users/1"));
    }

    #[test]
    fn test_empty_path_info_sentinel_is_preserved() {
        let mut req = FakeRequest::new("/app/users/1", &[("SCRIPT_NAME", Some("/app")), ("PATH_INFO", Some(""))]);
        let env = Environment::from_request(&mut req);

        assert_eq!(env.str_var(key::PATH_INFO), Some(""));
        assert_eq!(env.str_var(key::REQUEST_PATH), Some("/app"));
    }

    #[test]
    fn test_preset_nonempty_path_info_is_recomputed() {
        let mut req = FakeRequest::new("/other", &[("PATH_INFO", Some("/stale"))]);
        let env = Environment::from_request(&mut req);

        assert_eq!(env.str_var(key::PATH_INFO), Some("/other"));
    }

    #[test]
    fn test_preset_request_path_is_kept() {
        let mut req = FakeRequest::new("/a/b", &[("REQUEST_PATH", Some("/pre/resolved"))]);
        let env = Environment::from_request(&mut req);

        assert_eq!(env.str_var(key::REQUEST_PATH), Some("/pre/resolved"));
    }

    #[test]
    fn test_script_name_longer_than_path() {
        let mut req = FakeRequest::new("/x", &[("SCRIPT_NAME", Some("/much-longer"))]);
        let env = Environment::from_request(&mut req);

        assert_eq!(env.str_var(key::PATH_INFO), Some(""));
    }

    #[test]
    fn test_input_stream_is_binary() {
        let mut req = FakeRequest::new("/", &[]);
        req.body = b"\x00\x01binary";
        let mut env = Environment::from_request(&mut req);

        let mut buf = Vec::new();
        env.input().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"\x00\x01binary");
    }
}
