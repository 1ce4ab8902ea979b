use std::io::{ErrorKind, Read};

use crate::error::CheckError;

const USER_AGENT: &str = concat!("check_graphite/", env!("CARGO_PKG_VERSION"));
const CHUNK_SIZE: usize = 8 * 1024;
const MAX_REDIRECTS: usize = 10;
const MAX_PRERESERVE: usize = 1024 * 1024;

/// Retrieves the body behind a url.
///
/// [HttpFetcher] is the real implementation, tests substitute their own.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<ResponseBuffer, CheckError>;
}

/// Growable byte buffer which collects a streamed response body.
///
/// Growth goes through fallible reservation so running out of memory surfaces as
/// [CheckError::Resource] instead of aborting the process.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    data: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes room for at least `additional` more bytes.
    pub fn reserve(&mut self, additional: usize) -> Result<(), CheckError> {
        self.data
            .try_reserve(additional)
            .map_err(|_| CheckError::Resource {
                requested: additional,
            })
    }

    pub fn extend_from_slice(&mut self, chunk: &[u8]) -> Result<(), CheckError> {
        self.reserve(chunk.len())?;
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    /// Drains `reader` into the buffer and returns the number of bytes read.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<usize, CheckError> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let mut total = 0;

        loop {
            match reader.read(&mut chunk) {
                Ok(0) => return Ok(total),
                Ok(n) => {
                    self.extend_from_slice(&chunk[..n])?;
                    total += n;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Blocking HTTP transport. Follows redirects, treats non-2xx answers as errors and never
/// retries.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, CheckError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<ResponseBuffer, CheckError> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        tracing::debug!(status = %response.status(), "graphite responded");

        let mut buffer = ResponseBuffer::new();
        buffer.reserve(prereserve(response.content_length()))?;
        buffer.read_from(&mut response)?;
        if buffer.is_empty() {
            tracing::warn!("graphite returned an empty body");
        }
        tracing::debug!(bytes = buffer.len(), "response buffered");

        Ok(buffer)
    }
}

/// Capacity to set aside before reading, from the announced `Content-Length`. Capped so a
/// server cannot make us allocate ahead of the bytes it actually sends.
fn prereserve(content_length: Option<u64>) -> usize {
    content_length
        .map(|length| usize::try_from(length).unwrap_or(usize::MAX))
        .unwrap_or(0)
        .min(MAX_PRERESERVE)
}

#[cfg(test)]
mod tests {
    use std::io;

    use mockito::Matcher;

    use super::*;

    /// Hands out data a few bytes at a time and interrupts every other call.
    struct TrickleReader {
        data: &'static [u8],
        interrupt: bool,
    }

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            let n = self.data.len().min(buf.len()).min(3);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::ConnectionReset, "reset by peer"))
        }
    }

    #[test]
    fn test_buffer_collects_chunks() {
        let mut reader = TrickleReader {
            data: b"[{\"datapoints\":[]}]",
            interrupt: false,
        };
        let mut buffer = ResponseBuffer::new();

        assert_eq!(buffer.read_from(&mut reader).unwrap(), 19);
        assert_eq!(buffer.as_bytes(), b"[{\"datapoints\":[]}]");
        assert_eq!(buffer.len(), 19);
    }

    #[test]
    fn test_buffer_appends() {
        let mut buffer = ResponseBuffer::new();
        assert!(buffer.is_empty());
        buffer.extend_from_slice(b"ab").unwrap();
        buffer.extend_from_slice(b"cd").unwrap();
        assert_eq!(buffer.as_bytes(), b"abcd");
    }

    #[test]
    fn test_buffer_allocation_failure() {
        let mut buffer = ResponseBuffer::new();
        let err = buffer.reserve(usize::MAX).unwrap_err();
        assert!(matches!(err, CheckError::Resource { requested } if requested == usize::MAX));
    }

    #[test]
    fn test_buffer_read_error_is_transport() {
        let err = ResponseBuffer::new()
            .read_from(&mut BrokenReader)
            .unwrap_err();
        assert_eq!(&err.to_string(), "HTTP error - reset by peer");
    }

    #[test]
    fn test_http_fetch() -> anyhow::Result<()> {
        let body = r#"[{"target":"a.b","datapoints":[[1.0,1700000000],[null,1700000060]]}]"#;
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/render/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("target".into(), "a.b".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("from".into(), "-5mins".into()),
            ]))
            .match_header("user-agent", Matcher::Regex("^check_graphite/".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        let url = format!("{}/render/?target=a.b&format=json&from=-5mins", server.url());
        let buffer = HttpFetcher::new()?.fetch(&url)?;

        mock.assert();
        assert_eq!(buffer.as_bytes(), body.as_bytes());
        Ok(())
    }

    #[test]
    fn test_http_error_status() -> anyhow::Result<()> {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/render/")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .expect(1)
            .create();

        let url = format!("{}/render/?target=a.b&format=json&from=-5mins", server.url());
        let err = HttpFetcher::new()?.fetch(&url).unwrap_err();

        mock.assert();
        assert!(matches!(err, CheckError::Transport(_)));
        assert!(err.to_string().contains("500"));
        Ok(())
    }

    #[test]
    fn test_http_connection_refused() -> anyhow::Result<()> {
        let err = HttpFetcher::new()?
            .fetch("http://127.0.0.1:1/render/?target=a&format=json&from=-5mins")
            .unwrap_err();
        assert!(matches!(err, CheckError::Transport(_)));
        assert!(
            err.to_string().to_lowercase().contains("connection refused"),
            "{}",
            err
        );
        Ok(())
    }

    #[test]
    fn test_prereserve_is_capped() {
        assert_eq!(prereserve(None), 0);
        assert_eq!(prereserve(Some(512)), 512);
        assert_eq!(prereserve(Some(MAX_PRERESERVE as u64 + 1)), MAX_PRERESERVE);
        assert_eq!(prereserve(Some(u64::MAX)), MAX_PRERESERVE);
    }
}
