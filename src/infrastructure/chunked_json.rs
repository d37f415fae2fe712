// Chunked JSON streaming: u32 big-endian length prefix, then the frame
use crate::application::channels::PushMessage;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use std::future::Future;
use tokio::sync::broadcast;

/// Create a chunked JSON streaming response
pub fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = PushMessage> + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(&msg, compress).await });

    let body = Body::from_stream(byte_stream);

    // Chunks are compressed one by one, so no Content-Encoding on the response
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-json-frames")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single message to a length-prefixed chunk
pub async fn serialize_chunk(msg: &PushMessage, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(msg)?;

    let payload = if compress { brotli_compress(json).await? } else { json };

    let length = u32::try_from(payload.len())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "frame too large"))?;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Messages from a topic receiver; lagging turns into an error frame.
pub fn receiver_stream(mut rx: broadcast::Receiver<PushMessage>) -> impl Stream<Item = PushMessage> + Send {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(msg) => yield msg,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "stream subscriber lagging");
                    yield PushMessage::error("lagged", format!("{} messages skipped", skipped));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Helper to create a streaming response from a topic receiver. The stream
/// ends when `stop` completes.
pub fn stream_from_receiver<F>(
    rx: broadcast::Receiver<PushMessage>,
    compress: bool,
    stop: F,
) -> impl IntoResponse
where
    F: Future<Output = ()> + Send + 'static,
{
    match chunked_json_stream(receiver_stream(rx).take_until(stop), compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
