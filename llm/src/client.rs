use anyhow::Context;
use futures::stream::Stream;
use futures::{
    StreamExt,
    stream::{self},
};
use reqwest::header::HeaderMap;
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Debug, pin::Pin};
use tracing::{instrument, warn};

#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
}

pub type BoxedStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

impl Client {
    pub fn with_headers(headers: HeaderMap) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Client { client })
    }

    /// POST `request` and decode the response body as a line-delimited event
    /// stream. `process` selects the JSON payload out of each line (e.g. strips
    /// an SSE `data: ` prefix) and returns None for lines to skip.
    #[instrument(level = "trace", skip(self, request, process))]
    pub async fn post_stream<U, S, F, T>(
        &self,
        url: U,
        request: &S,
        process: F,
    ) -> anyhow::Result<BoxedStream<anyhow::Result<T>>>
    where
        U: reqwest::IntoUrl + Debug,
        S: Serialize + Sized,
        T: DeserializeOwned + Send + 'static,
        F: Fn(&str) -> Option<&str> + 'static + Send,
    {
        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(anyhow::anyhow!(
                "Request failed with status {}: {}",
                status,
                error_body
            ));
        }

        let bytes = response.bytes_stream();

        // Lines and multi-byte characters can be split across network chunks;
        // the buffer carries the incomplete tail into the next chunk.
        let buffered_stream = bytes.scan(Vec::new(), move |buffer, chunk| {
            let items = match chunk {
                Ok(chunk) => {
                    buffer.extend_from_slice(&chunk);
                    drain_lines(buffer, &process).into_iter().map(Ok).collect()
                }
                Err(e) => {
                    let e = anyhow::Error::new(e).context("error reading response stream");
                    vec![Err(e)]
                }
            };
            futures::future::ready(Some(items))
        });

        Ok(Box::pin(buffered_stream.flat_map(stream::iter)))
    }
}

/// Parse every complete line in `buffer`, leaving the trailing partial line
/// in place. Lines are decoded only once complete. Lines that fail to decode
/// or parse are logged and dropped.
pub(crate) fn drain_lines<T, F>(buffer: &mut Vec<u8>, process: &F) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&str) -> Option<&str>,
{
    let mut messages = Vec::new();
    let mut line_start = 0;

    while let Some(offset) = buffer[line_start..].iter().position(|&b| b == b'\n') {
        let raw = &buffer[line_start..line_start + offset];
        line_start += offset + 1;

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim_end_matches('\r'),
            Err(e) => {
                warn!(error = %e, "stream line is not valid UTF-8");
                continue;
            }
        };
        let Some(payload) = process(line) else {
            continue;
        };
        if payload.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(payload) {
            Ok(message) => messages.push(message),
            Err(e) => warn!(line = payload, error = %e, "failed to parse stream line"),
        }
    }

    buffer.drain(..line_start);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestEvent {
        id: u32,
        text: String,
    }

    fn sse(line: &str) -> Option<&str> {
        line.strip_prefix("data: ")
    }

    #[test]
    fn test_complete_lines() {
        let mut buffer =
            b"data: {\"id\":1,\"text\":\"hello\"}\ndata: {\"id\":2,\"text\":\"world\"}\n".to_vec();
        let events: Vec<TestEvent> = drain_lines(&mut buffer, &sse);

        assert_eq!(events.len(), 2);
        assert_eq!(events[1], TestEvent { id: 2, text: "world".to_string() });
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut buffer = Vec::new();

        buffer.extend_from_slice(b"data: {\"id\":1,\"te");
        let events: Vec<TestEvent> = drain_lines(&mut buffer, &sse);
        assert!(events.is_empty());
        assert_eq!(buffer, b"data: {\"id\":1,\"te");

        buffer.extend_from_slice(b"xt\":\"hello\"}\r\ndata: {\"id\":2");
        let events: Vec<TestEvent> = drain_lines(&mut buffer, &sse);
        assert_eq!(events, vec![TestEvent { id: 1, text: "hello".to_string() }]);
        assert_eq!(buffer, b"data: {\"id\":2");
    }

    #[test]
    fn test_character_split_across_chunks() {
        let line = "data: {\"id\":1,\"text\":\"café\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut buffer = Vec::new();

        buffer.extend_from_slice(&line[..split]);
        let events: Vec<TestEvent> = drain_lines(&mut buffer, &sse);
        assert!(events.is_empty());

        buffer.extend_from_slice(&line[split..]);
        let events: Vec<TestEvent> = drain_lines(&mut buffer, &sse);
        assert_eq!(events, vec![TestEvent { id: 1, text: "café".to_string() }]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_skips_blank_foreign_and_malformed_lines() {
        let mut buffer = b"\nevent: ping\ndata: \ndata: {not json}\ndata: \xFF\xFE\n".to_vec();
        buffer.extend_from_slice(b"data: {\"id\":3,\"text\":\"ok\"}\n");
        let events: Vec<TestEvent> = drain_lines(&mut buffer, &sse);
        assert_eq!(events, vec![TestEvent { id: 3, text: "ok".to_string() }]);
    }
}
