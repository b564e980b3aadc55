use super::api::{GenerateContentRequest, GenerateContentResponse};
use crate::client::Client;
use crate::traffic_log;
use crate::{ChatChunk, ChatModel, ChatRequest, ChatStream};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

pub struct GeminiChatModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl GeminiChatModel {
    pub fn new(client: Client, base_url: String, model_name: String) -> Self {
        GeminiChatModel {
            client,
            base_url,
            model_name,
        }
    }

    fn stream_url(&self) -> String {
        // Model ids from the models listing already carry the "models/" prefix.
        let model_path = if self.model_name.starts_with("models/") {
            self.model_name.clone()
        } else {
            format!("models/{}", self.model_name)
        };
        format!(
            "{}/{}:streamGenerateContent?alt=sse",
            self.base_url, model_path
        )
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn stream_chat(&self, request: &ChatRequest) -> anyhow::Result<ChatStream> {
        let url = self.stream_url();
        let api_request = GenerateContentRequest::from(request);
        traffic_log::log_stream_start(&self.model_name, &api_request);
        debug!(
            model = %self.model_name,
            contents = api_request.contents.len(),
            "opening gemini stream"
        );

        let streamed_response = match self
            .client
            .post_stream(url, &api_request, |line: &str| line.strip_prefix("data: "))
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                traffic_log::log_error(&self.model_name, &e.to_string());
                return Err(e);
            }
        };

        let model_name = self.model_name.clone();
        Ok(Box::pin(streamed_response.map(
            move |event: anyhow::Result<GenerateContentResponse>| {
                let chunk = event.and_then(|response| {
                    traffic_log::log_stream_response(&model_name, &response);
                    ChatChunk::try_from(response)
                });
                if let Err(e) = &chunk {
                    traffic_log::log_error(&model_name, &e.to_string());
                }
                chunk
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn model(name: &str) -> GeminiChatModel {
        GeminiChatModel::new(
            Client::with_headers(HeaderMap::new()).unwrap(),
            "https://example.test/v1beta".to_string(),
            name.to_string(),
        )
    }

    #[test]
    fn test_stream_url_adds_models_prefix() {
        assert_eq!(
            model("gemini-1.5-flash").stream_url(),
            "https://example.test/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_stream_url_keeps_existing_prefix() {
        assert_eq!(
            model("models/gemini-1.5-pro").stream_url(),
            "https://example.test/v1beta/models/gemini-1.5-pro:streamGenerateContent?alt=sse"
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let model = GeminiChatModel::new(
            Client::with_headers(HeaderMap::new()).unwrap(),
            "http://127.0.0.1:1/v1beta".to_string(),
            "gemini-1.5-flash".to_string(),
        );
        let request = ChatRequest::new(vec![crate::ChatMessage::user("Hi")]);
        assert!(model.stream_chat(&request).await.is_err());
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    /// Answer one request with an SSE body written in the given pieces.
    async fn serve_sse(pieces: Vec<Vec<u8>>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let head = concat!(
                "HTTP/1.1 200 OK\r\n",
                "content-type: text/event-stream\r\n",
                "connection: close\r\n\r\n",
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            for piece in pieces {
                socket.write_all(&piece).await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/v1beta", addr)
    }

    fn local_model(base_url: String) -> GeminiChatModel {
        GeminiChatModel::new(
            Client::with_headers(HeaderMap::new()).unwrap(),
            base_url,
            "gemini-1.5-flash".to_string(),
        )
    }

    async fn collect(model: &GeminiChatModel) -> Vec<anyhow::Result<ChatChunk>> {
        let request = ChatRequest::new(vec![crate::ChatMessage::user("Hi")]);
        model.stream_chat(&request).await.unwrap().collect().await
    }

    #[tokio::test]
    async fn test_error_event_mid_stream_surfaces_as_error() {
        let base_url = serve_sse(vec![
            br#"data: {"candidates": [{"content": {"parts": [{"text": "Ada "}]}}]}"#.to_vec(),
            b"\n\n".to_vec(),
            br#"data: {"error": {"code": 503, "message": "The model is overloaded."}}"#.to_vec(),
            b"\n\n".to_vec(),
        ])
        .await;

        let items = collect(&local_model(base_url)).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().get_text(), "Ada ");
        let err = items[1].as_ref().unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_character_split_between_writes_is_preserved() {
        let line = r#"data: {"candidates": [{"content": {"parts": [{"text": "café"}]}}]}"#;
        let bytes = format!("{}\n\n", line).into_bytes();
        let split = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let base_url = serve_sse(vec![bytes[..split].to_vec(), bytes[split..].to_vec()]).await;

        let items = collect(&local_model(base_url)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().get_text(), "café");
    }
}
