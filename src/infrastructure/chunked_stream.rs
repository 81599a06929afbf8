// Chunked frame streaming utilities
use crate::application::render_sync::RenderFrame;
use crate::infrastructure::http_response::brotli_compress;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Each chunk is a 4-byte big-endian length followed by one JSON frame.
/// Compression is per chunk, so no `Content-Encoding` is set on the response.
pub fn chunked_frame_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = RenderFrame> + Send + 'static,
{
    let byte_stream = stream.then(move |frame| async move { encode_chunk(&frame, compress).await });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn encode_chunk(frame: &RenderFrame, compress: bool) -> std::io::Result<Bytes> {
    let json = serde_json::to_vec(frame)?;
    let payload = if compress {
        brotli_compress(&json).await?
    } else {
        json
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);
    Ok(chunk.freeze())
}

/// Stream the current frame, then every frame the dashboard publishes.
/// A lagging client skips the frames it missed.
pub fn stream_from_receiver(
    initial: RenderFrame,
    rx: broadcast::Receiver<RenderFrame>,
    compress: bool,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        let mut rx = rx;
        yield initial;
        loop {
            match rx.recv().await {
                Ok(frame) => {
                    yield frame;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Frame stream lagged, skipped {} frames", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    match chunked_frame_stream(stream, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render_sync::build_frame;
    use crate::domain::view::{DataStatus, ViewState};
    use std::collections::BTreeSet;

    fn idle_frame() -> RenderFrame {
        build_frame(
            &DataStatus::Idle,
            &ViewState::default(),
            None,
            &BTreeSet::new(),
            "PJM",
            false,
        )
    }

    #[tokio::test]
    async fn test_chunk_is_length_prefixed_json() {
        let frame = idle_frame();
        let chunk = encode_chunk(&frame, false).await.unwrap();

        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(length, chunk.len() - 4);

        let body: serde_json::Value = serde_json::from_slice(&chunk[4..]).unwrap();
        assert_eq!(body["status"]["state"], "idle");
    }
}
