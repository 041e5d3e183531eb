//! `http://host[:port]/path` and `host[:port]` endpoint parsing.

use core::fmt;

pub const HTTP_PORT: u16 = 80;
pub const MQTT_PORT: u16 = 1883;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UrlError {
    UnsupportedScheme,
    MissingHost,
    InvalidPort,
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedScheme => f.write_str("only http:// urls are supported"),
            Self::MissingHost => f.write_str("url has no host"),
            Self::InvalidPort => f.write_str("url port is not a number in 1..=65535"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Endpoint<'a> {
    pub host: &'a str,
    pub port: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HttpUrl<'a> {
    pub host: &'a str,
    pub port: u16,
    /// Always starts with `/`.
    pub path: &'a str,
}

/// Splits `host[:port]`, falling back to `default_port`.
pub fn parse_endpoint(text: &str, default_port: u16) -> Result<Endpoint<'_>, UrlError> {
    let text = text.trim();
    let (host, port) = match text.rsplit_once(':') {
        Some((host, port)) => (host, parse_port(port)?),
        None => (text, default_port),
    };

    if host.is_empty() {
        return Err(UrlError::MissingHost);
    }
    Ok(Endpoint { host, port })
}

pub fn parse_http_url(text: &str) -> Result<HttpUrl<'_>, UrlError> {
    let text = text.trim();
    let scheme_len = "http://".len();
    let rest = match text.get(..scheme_len) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http://") => &text[scheme_len..],
        _ => return Err(UrlError::UnsupportedScheme),
    };

    let (authority, path) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, "/"),
    };
    let endpoint = parse_endpoint(authority, HTTP_PORT)?;

    Ok(HttpUrl {
        host: endpoint.host,
        port: endpoint.port,
        path,
    })
}

fn parse_port(text: &str) -> Result<u16, UrlError> {
    match text.parse::<u16>() {
        Ok(0) | Err(_) => Err(UrlError::InvalidPort),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_url_with_port_and_path() {
        let url = parse_http_url("http://boiler.lan:8080/status.html?x=1").unwrap();
        assert_eq!(url.host, "boiler.lan");
        assert_eq!(url.port, 8080);
        assert_eq!(url.path, "/status.html?x=1");
    }

    #[test]
    fn http_url_defaults() {
        let url = parse_http_url("HTTP://192.168.1.20").unwrap();
        assert_eq!(url, HttpUrl { host: "192.168.1.20", port: 80, path: "/" });
    }

    #[test]
    fn rejects_other_schemes_and_bad_ports() {
        assert_eq!(parse_http_url("https://x/"), Err(UrlError::UnsupportedScheme));
        assert_eq!(parse_http_url("http://:80/"), Err(UrlError::MissingHost));
        assert_eq!(parse_http_url("http://x:0/"), Err(UrlError::InvalidPort));
        assert_eq!(parse_endpoint("broker:mqtt", MQTT_PORT), Err(UrlError::InvalidPort));
    }

    #[test]
    fn endpoint_falls_back_to_default_port() {
        assert_eq!(
            parse_endpoint(" broker.lan ", MQTT_PORT),
            Ok(Endpoint { host: "broker.lan", port: 1883 })
        );
        assert_eq!(parse_endpoint("10.0.0.2:1884", MQTT_PORT).map(|e| e.port), Ok(1884));
    }
}
