//! HTTP/1.0 GET request and response framing.

use core::fmt;

use heapless::Vec;

use super::{BufferFull, Writer};

const HEADER_END: &[u8] = b"\r\n\r\n";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HttpError {
    BufferTooSmall,
    MalformedStatusLine,
    /// Server answered with a non-2xx status.
    Status(u16),
}

impl From<BufferFull> for HttpError {
    fn from(_: BufferFull) -> Self {
        Self::BufferTooSmall
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => f.write_str("http message does not fit the buffer"),
            Self::MalformedStatusLine => f.write_str("malformed http status line"),
            Self::Status(code) => write!(f, "http status {}", code),
        }
    }
}

/// Writes a `GET` request that asks the server to close after replying.
pub fn encode_get(out: &mut [u8], host: &str, path: &str) -> Result<usize, HttpError> {
    let mut writer = Writer::new(out);
    writer.put(b"GET ")?;
    writer.put(path.as_bytes())?;
    writer.put(b" HTTP/1.0\r\nHost: ")?;
    writer.put(host.as_bytes())?;
    writer.put(b"\r\nUser-Agent: homedash\r\nConnection: close\r\n\r\n")?;
    Ok(writer.len())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Response<'a> {
    pub status: u16,
    pub body: &'a [u8],
}

impl<'a> Response<'a> {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a 2xx response, or the status as an error.
    pub fn into_body(self) -> Result<&'a [u8], HttpError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(HttpError::Status(self.status))
        }
    }
}

/// Parses a response read up to end of stream.
///
/// Returns `None` until the blank line ending the headers has arrived.
pub fn parse_response(buf: &[u8]) -> Result<Option<Response<'_>>, HttpError> {
    let Some(header_len) = buf.windows(HEADER_END.len()).position(|w| w == HEADER_END) else {
        return Ok(None);
    };

    let line_end = buf[..header_len]
        .iter()
        .position(|&b| b == b'\r')
        .unwrap_or(header_len);
    let status_line =
        core::str::from_utf8(&buf[..line_end]).map_err(|_| HttpError::MalformedStatusLine)?;
    let status = parse_status_line(status_line)?;

    Ok(Some(Response {
        status,
        body: &buf[header_len + HEADER_END.len()..],
    }))
}

fn parse_status_line(line: &str) -> Result<u16, HttpError> {
    let mut parts = line.split_ascii_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") && code.len() == 3 => {
            code.parse().map_err(|_| HttpError::MalformedStatusLine)
        }
        _ => Err(HttpError::MalformedStatusLine),
    }
}

/// Keeps a bounded slice of a streamed body positioned around `anchor`.
///
/// Until the anchor shows up the window slides forward by half its size, so
/// an anchor split across chunks and the start of its tag both survive.
/// Once found, the
/// window restarts at the tag holding it and fills up to `N` bytes.
/// An empty anchor keeps the first `N` bytes.
pub struct BodyWindow<'a, const N: usize> {
    anchor: &'a [u8],
    bytes: Vec<u8, N>,
    anchored: bool,
}

impl<'a, const N: usize> BodyWindow<'a, N> {
    pub fn new(anchor: &'a str) -> Self {
        Self {
            anchor: anchor.as_bytes(),
            bytes: Vec::new(),
            anchored: anchor.is_empty(),
        }
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Whether the window is full around the anchor and further bytes
    /// would be discarded.
    pub fn is_complete(&self) -> bool {
        self.anchored && self.bytes.is_full()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8, N> {
        self.bytes
    }

    /// Feeds the next chunk. Returns `false` once no more bytes are needed.
    pub fn push(&mut self, mut chunk: &[u8]) -> bool {
        while !chunk.is_empty() {
            if self.bytes.is_full() {
                if self.anchored {
                    return false;
                }
                self.slide();
            }

            let take = chunk.len().min(N - self.bytes.len());
            let searched_from = self.bytes.len().saturating_sub(self.anchor.len());
            let _ = self.bytes.extend_from_slice(&chunk[..take]);
            chunk = &chunk[take..];

            if !self.anchored {
                self.seek_anchor(searched_from);
            }
        }

        !self.is_complete()
    }

    fn seek_anchor(&mut self, from: usize) {
        let Some(found) = self.bytes[from..]
            .windows(self.anchor.len())
            .position(|w| w == self.anchor)
        else {
            return;
        };

        let at = from + found;
        let start = self.bytes[..at].iter().rposition(|&b| b == b'<').unwrap_or(at);
        self.drop_front(start);
        self.anchored = true;
    }

    fn slide(&mut self) {
        let keep = (N / 2)
            .max(self.anchor.len().saturating_sub(1))
            .min(self.bytes.len());
        self.drop_front(self.bytes.len() - keep);
    }

    fn drop_front(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let len = self.bytes.len();
        self.bytes.copy_within(count..len, 0);
        self.bytes.truncate(len - count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_request_layout() {
        let mut buf = [0u8; 128];
        let len = encode_get(&mut buf, "boiler.lan", "/status").unwrap();
        assert_eq!(
            &buf[..len],
            b"GET /status HTTP/1.0\r\nHost: boiler.lan\r\nUser-Agent: homedash\r\nConnection: close\r\n\r\n"
        );
        assert_eq!(
            encode_get(&mut buf[..16], "boiler.lan", "/status"),
            Err(HttpError::BufferTooSmall)
        );
    }

    #[test]
    fn response_body_follows_headers() {
        let wire = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<td id=\"analogOutTemp\">63.4</td>";
        let response = parse_response(wire).unwrap().unwrap();
        assert!(response.is_success());
        assert!(response.into_body().unwrap().starts_with(b"<td"));
    }

    #[test]
    fn partial_headers_need_more_bytes() {
        assert_eq!(parse_response(b"HTTP/1.0 200 OK\r\nServer: x\r\n"), Ok(None));
    }

    #[test]
    fn error_status_is_reported() {
        let response = parse_response(b"HTTP/1.0 404 Not Found\r\n\r\n").unwrap().unwrap();
        assert_eq!(response.into_body(), Err(HttpError::Status(404)));
        assert_eq!(
            parse_response(b"garbage\r\n\r\n"),
            Err(HttpError::MalformedStatusLine)
        );
    }

    #[test]
    fn small_body_is_kept_whole() {
        let mut window = BodyWindow::<64>::new("analogOutTemp");
        assert!(window.push(b"<p>x</p><td id=\"analogOutTemp\">63.4</td>"));
        assert!(window.is_anchored());
        assert!(window.as_bytes().starts_with(b"<td id="));
    }

    #[test]
    fn window_slides_to_late_anchor() {
        let mut window = BodyWindow::<32>::new("analogOutTemp");
        for _ in 0..10 {
            assert!(window.push(b"<div>filler filler</div>"));
        }
        assert!(!window.is_anchored());

        window.push(b"<td id=\"analog");
        window.push(b"OutTemp\">63.4</td><p>trailing text</p>");
        assert!(window.is_anchored());
        assert!(window.is_complete());
        assert_eq!(window.as_bytes(), b"<td id=\"analogOutTemp\">63.4</td>");
        assert!(!window.push(b"more"));
    }

    #[test]
    fn empty_anchor_keeps_the_head() {
        let mut window = BodyWindow::<4>::new("");
        assert!(!window.push(b"abcdef"));
        assert_eq!(window.into_bytes().as_slice(), b"abcd");
    }
}
