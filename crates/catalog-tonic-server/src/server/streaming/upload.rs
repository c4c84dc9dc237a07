//! Client-streaming image ingest.
//!
//! Per-call state machine: the first message must carry the image info,
//! every later message contributes one chunk. The accumulated size is
//! bounded by [`types::MAX_IMAGE_SIZE`]; once the ceiling is exceeded the
//! call aborts and the content store is never asked to persist a truncated
//! or over-limit buffer.

use crate::server::context::CallContext;
use bytes::{Bytes, BytesMut};
use catalog_tonic_core::proto::{ImageInfo, UploadImageRequest, upload_image_request};
use catalog_tonic_core::{Error, Result, types};
use tonic::Streaming;

/// Receives the mandatory first message of an upload stream.
pub async fn read_info(stream: &mut Streaming<UploadImageRequest>) -> Result<ImageInfo> {
    let first = stream.message().await.map_err(|status| Error::StreamRecv {
        context: format!("cannot receive image info: {status}"),
    })?;

    match first.and_then(|req| req.data) {
        Some(upload_image_request::Data::Info(info)) => Ok(info),
        _ => Err(Error::StreamRecv {
            context: "image info is missing".to_owned(),
        }),
    }
}

/// Receives image chunks until end-of-stream, enforcing the size ceiling.
///
/// The caller context is re-checked before each receive so a dead caller
/// stops the loop at the next iteration boundary.
pub async fn read_chunks(
    ctx: &CallContext,
    stream: &mut Streaming<UploadImageRequest>,
) -> Result<Bytes> {
    let mut data = BytesMut::new();

    loop {
        ctx.check()?;

        let message = stream.message().await.map_err(|status| match status.code() {
            tonic::Code::Cancelled => Error::Cancelled,
            tonic::Code::DeadlineExceeded => Error::DeadlineExceeded,
            _ => Error::StreamRecv {
                context: format!("cannot receive image data: {status}"),
            },
        })?;

        let Some(req) = message else {
            // End of stream: the buffer is complete.
            return Ok(data.freeze());
        };

        let chunk = match req.data {
            Some(upload_image_request::Data::ChunkData(chunk)) => chunk,
            _ => {
                return Err(Error::StreamRecv {
                    context: "expected an image chunk".to_owned(),
                });
            }
        };

        let size = data.len() + chunk.len();
        if size > types::MAX_IMAGE_SIZE {
            return Err(Error::ImageTooLarge {
                size,
                max: types::MAX_IMAGE_SIZE,
            });
        }

        data.extend_from_slice(&chunk);
    }
}
