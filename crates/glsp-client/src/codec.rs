//! Content-Length framed JSON-RPC 2.0 codec.
//!
//! Messages are framed as `Content-Length: N\r\n\r\n{json}` over an
//! arbitrary byte channel (socket, pipe, in-memory duplex). This module
//! provides the framing reader/writer and the translation between raw
//! JSON values and [`RpcIncoming`] messages.
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::ClientError;

/// Maximum accepted frame body size. Bounds allocation on malformed or
/// hostile Content-Length headers.
const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// An incoming JSON-RPC message, already classified.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcIncoming {
    /// A response to one of our requests.
    Response {
        /// Id of the request this answers.
        id: i64,
        /// The result, or the server's error.
        result: Result<Value, RpcFailure>,
    },
    /// A server-initiated notification.
    Notification {
        /// The method name.
        method: String,
        /// The params.
        params: Value,
    },
    /// A server-initiated request. The GLSP protocol does not use these;
    /// they are surfaced so callers can log them.
    Request {
        /// The request id.
        id: i64,
        /// The method name.
        method: String,
        /// The params.
        params: Value,
    },
}

/// The error object of a JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcFailure {
    /// The error code.
    pub code: i64,
    /// The error message.
    pub message: String,
}

/// Encode a request frame.
pub fn encode_request(id: i64, method: &str, params: &Value) -> Vec<u8> {
    frame(
        &serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        })
        .to_string(),
    )
}

/// Encode a notification frame (no id, no response expected).
pub fn encode_notification(method: &str, params: &Value) -> Vec<u8> {
    frame(
        &serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        })
        .to_string(),
    )
}

fn frame(body: &str) -> Vec<u8> {
    let mut bytes = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

/// Classify a decoded JSON value as a response, notification, or request.
///
/// Returns `Ok(None)` for messages with a JSON-RPC-legal but non-integer
/// id: we only ever issue integer ids, so nothing can be routed to such a
/// message and the caller skips it instead of dropping the connection.
pub fn classify(value: Value) -> Result<Option<RpcIncoming>, ClientError> {
    let method = value.get("method").and_then(Value::as_str);
    match value.get("id") {
        Some(id_field) => {
            let Some(id) = id_field.as_i64() else {
                tracing::warn!(id = %id_field, "skipping message with non-integer id");
                return Ok(None);
            };
            let incoming = match method {
                Some(method) => RpcIncoming::Request {
                    id,
                    method: method.to_string(),
                    params: value.get("params").cloned().unwrap_or(Value::Null),
                },
                None => {
                    let result = if let Some(error) = value.get("error") {
                        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
                        let message = error
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error")
                            .to_string();
                        Err(RpcFailure { code, message })
                    } else {
                        Ok(value.get("result").cloned().unwrap_or(Value::Null))
                    };
                    RpcIncoming::Response { id, result }
                }
            };
            Ok(Some(incoming))
        }
        None => match method {
            Some(method) => Ok(Some(RpcIncoming::Notification {
                method: method.to_string(),
                params: value.get("params").cloned().unwrap_or(Value::Null),
            })),
            None => Err(ClientError::InvalidFrame(
                "message has neither id nor method".to_string(),
            )),
        },
    }
}

/// Reads framed JSON-RPC messages from an async byte stream.
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a raw reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read and classify the next routable message, skipping frames
    /// [`classify`] declines.
    ///
    /// Returns `Ok(None)` on clean EOF before any header byte.
    pub async fn read_message(&mut self) -> Result<Option<RpcIncoming>, ClientError> {
        loop {
            let length = match self.read_headers().await? {
                Some(length) => length,
                None => return Ok(None),
            };
            if length > MAX_FRAME_BYTES {
                return Err(ClientError::InvalidFrame(format!(
                    "Content-Length {} exceeds maximum {}",
                    length, MAX_FRAME_BYTES
                )));
            }
            let mut body = vec![0u8; length];
            self.reader.read_exact(&mut body).await?;
            let value: Value = serde_json::from_slice(&body)
                .map_err(|err| ClientError::InvalidFrame(format!("invalid JSON body: {}", err)))?;
            if let Some(incoming) = classify(value)? {
                return Ok(Some(incoming));
            }
        }
    }

    async fn read_headers(&mut self) -> Result<Option<usize>, ClientError> {
        let mut content_length: Option<usize> = None;
        let mut line = String::new();
        let mut saw_header = false;
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                if saw_header {
                    return Err(ClientError::InvalidFrame(
                        "unexpected EOF while reading headers".to_string(),
                    ));
                }
                return Ok(None);
            }
            saw_header = true;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            if let Some((key, rest)) = trimmed.split_once(':') {
                if key.eq_ignore_ascii_case("Content-Length") {
                    content_length = Some(rest.trim().parse().map_err(|_| {
                        ClientError::InvalidFrame(format!(
                            "invalid Content-Length: {}",
                            rest.trim()
                        ))
                    })?);
                }
                // Other headers (Content-Type) are ignored.
            }
        }
        content_length
            .map(Some)
            .ok_or_else(|| ClientError::InvalidFrame("missing Content-Length header".to_string()))
    }
}

/// Writes framed JSON-RPC messages to an async byte stream.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap a raw writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one pre-encoded frame and flush.
    pub async fn write_frame(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        self.writer.write_all(frame).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_request_shape() {
        let bytes = encode_request(1, "initialize", &serde_json::json!({"applicationId": "a"}));
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Content-Length: "));
        let body = text.split("\r\n\r\n").nth(1).unwrap();
        let value: Value = serde_json::from_str(body).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 1);
        assert_eq!(value["method"], "initialize");
        assert_eq!(value["params"]["applicationId"], "a");
    }

    #[test]
    fn encode_notification_has_no_id() {
        let bytes = encode_notification("process", &serde_json::json!({}));
        let text = String::from_utf8(bytes).unwrap();
        let body = text.split("\r\n\r\n").nth(1).unwrap();
        let value: Value = serde_json::from_str(body).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["method"], "process");
    }

    #[test]
    fn frame_length_matches_body() {
        let bytes = encode_notification("shutdown", &Value::Null);
        let text = String::from_utf8(bytes).unwrap();
        let (header, body) = text.split_once("\r\n\r\n").unwrap();
        let declared: usize = header.strip_prefix("Content-Length: ").unwrap().parse().unwrap();
        assert_eq!(declared, body.len());
    }

    #[test]
    fn classify_success_response() {
        let incoming = classify(serde_json::json!({
            "jsonrpc": "2.0", "id": 3, "result": {"protocolVersion": "1.0.0"}
        }))
        .unwrap()
        .unwrap();
        match incoming {
            RpcIncoming::Response { id, result } => {
                assert_eq!(id, 3);
                assert_eq!(result.unwrap()["protocolVersion"], "1.0.0");
            }
            other => panic!("expected response, got: {:?}", other),
        }
    }

    #[test]
    fn classify_error_response() {
        let incoming = classify(serde_json::json!({
            "jsonrpc": "2.0", "id": 3,
            "error": {"code": -32601, "message": "method not found"}
        }))
        .unwrap()
        .unwrap();
        match incoming {
            RpcIncoming::Response { result, .. } => {
                let failure = result.unwrap_err();
                assert_eq!(failure.code, -32601);
                assert_eq!(failure.message, "method not found");
            }
            other => panic!("expected response, got: {:?}", other),
        }
    }

    #[test]
    fn classify_null_result_response() {
        let incoming = classify(serde_json::json!({"jsonrpc": "2.0", "id": 1}))
            .unwrap()
            .unwrap();
        match incoming {
            RpcIncoming::Response { result, .. } => assert!(result.unwrap().is_null()),
            other => panic!("expected response, got: {:?}", other),
        }
    }

    #[test]
    fn classify_notification() {
        let incoming = classify(serde_json::json!({
            "jsonrpc": "2.0", "method": "process",
            "params": {"clientId": "c1", "action": {"kind": "elementSelected"}}
        }))
        .unwrap()
        .unwrap();
        match incoming {
            RpcIncoming::Notification { method, params } => {
                assert_eq!(method, "process");
                assert_eq!(params["clientId"], "c1");
            }
            other => panic!("expected notification, got: {:?}", other),
        }
    }

    #[test]
    fn classify_server_request() {
        let incoming = classify(serde_json::json!({
            "jsonrpc": "2.0", "id": 9, "method": "ping", "params": null
        }))
        .unwrap()
        .unwrap();
        assert!(matches!(incoming, RpcIncoming::Request { id: 9, .. }));
    }

    #[test]
    fn classify_rejects_empty_message() {
        assert!(classify(serde_json::json!({"jsonrpc": "2.0"})).is_err());
    }

    #[test]
    fn classify_skips_non_integer_id() {
        let incoming = classify(serde_json::json!({
            "jsonrpc": "2.0", "id": "abc-1", "result": {}
        }))
        .unwrap();
        assert!(incoming.is_none());

        let incoming = classify(serde_json::json!({
            "jsonrpc": "2.0", "id": "abc-2", "method": "ping", "params": null
        }))
        .unwrap();
        assert!(incoming.is_none());
    }

    #[tokio::test]
    async fn reader_decodes_consecutive_frames() {
        let mut data = encode_request(1, "a", &Value::Null);
        data.extend_from_slice(&encode_notification("b", &Value::Null));
        let mut reader = FrameReader::new(std::io::Cursor::new(data));

        match reader.read_message().await.unwrap().unwrap() {
            RpcIncoming::Request { id, method, .. } => {
                assert_eq!(id, 1);
                assert_eq!(method, "a");
            }
            other => panic!("expected request, got: {:?}", other),
        }
        match reader.read_message().await.unwrap().unwrap() {
            RpcIncoming::Notification { method, .. } => assert_eq!(method, "b"),
            other => panic!("expected notification, got: {:?}", other),
        }
        assert!(reader.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reader_skips_string_id_frame_and_continues() {
        let skipped =
            serde_json::json!({"jsonrpc": "2.0", "id": "s-1", "result": null}).to_string();
        let mut data =
            format!("Content-Length: {}\r\n\r\n{}", skipped.len(), skipped).into_bytes();
        data.extend_from_slice(&encode_notification("process", &Value::Null));
        let mut reader = FrameReader::new(std::io::Cursor::new(data));

        // The string-id frame is skipped, not a connection-fatal error.
        match reader.read_message().await.unwrap().unwrap() {
            RpcIncoming::Notification { method, .. } => assert_eq!(method, "process"),
            other => panic!("expected notification, got: {:?}", other),
        }
        assert!(reader.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reader_clean_eof_returns_none() {
        let mut reader = FrameReader::new(std::io::Cursor::new(Vec::<u8>::new()));
        assert!(reader.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reader_eof_mid_headers_is_error() {
        let mut reader = FrameReader::new(std::io::Cursor::new(b"Content-Length: 10".to_vec()));
        assert!(reader.read_message().await.is_err());
    }

    #[tokio::test]
    async fn reader_missing_content_length_is_error() {
        let data = b"Content-Type: application/json\r\n\r\n{}".to_vec();
        let mut reader = FrameReader::new(std::io::Cursor::new(data));
        assert!(reader.read_message().await.is_err());
    }

    #[tokio::test]
    async fn reader_rejects_oversized_frame() {
        let data = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_BYTES + 1).into_bytes();
        let mut reader = FrameReader::new(std::io::Cursor::new(data));
        let err = reader.read_message().await.unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[tokio::test]
    async fn reader_rejects_invalid_json_body() {
        let mut data = b"Content-Length: 8\r\n\r\n".to_vec();
        data.extend_from_slice(b"not json");
        let mut reader = FrameReader::new(std::io::Cursor::new(data));
        assert!(reader.read_message().await.is_err());
    }

    #[tokio::test]
    async fn reader_ignores_extra_headers() {
        let body = br#"{"jsonrpc":"2.0","id":1}"#;
        let mut data =
            format!("Content-Type: application/json\r\nContent-Length: {}\r\n\r\n", body.len())
                .into_bytes();
        data.extend_from_slice(body);
        let mut reader = FrameReader::new(std::io::Cursor::new(data));
        let incoming = reader.read_message().await.unwrap().unwrap();
        assert!(matches!(incoming, RpcIncoming::Response { id: 1, .. }));
    }

    #[tokio::test]
    async fn writer_then_reader_roundtrip() {
        let (client, mut server) = tokio::io::duplex(1024);
        let (reader_half, writer_half) = tokio::io::split(client);
        let mut writer = FrameWriter::new(writer_half);
        writer
            .write_frame(&encode_request(5, "initialize", &Value::Null))
            .await
            .unwrap();
        drop(writer);
        drop(reader_half);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut server, &mut buf).await.unwrap();
        let mut reader = FrameReader::new(std::io::Cursor::new(buf));
        let incoming = reader.read_message().await.unwrap().unwrap();
        assert!(matches!(incoming, RpcIncoming::Request { id: 5, .. }));
    }
}
