//! gRPC service implementation for the laptop catalog.
//!
//! This module defines [`CatalogService`], the concrete implementation of
//! the [`Catalog`] gRPC service defined in the protobuf specification: one
//! handler per call shape over the shared stores.
//!
//! ## Responsibilities
//!
//! - Validate incoming requests and translate store errors at the boundary.
//! - Stream search results with backpressure while the scan runs on the
//!   blocking pool.
//! - Drive the upload state machine and hand complete buffers to the
//!   content store.
//! - Keep rating responses in strict arrival order, one per request.
//! - Propagate cancellation and deadlines into every long-running loop.

use crate::server::config::ServerConfig;
use crate::server::context::CallContext;
use crate::server::store::{ImageStore, LaptopStore, RatingStore};
use crate::server::streaming::{guard::Guarded, rate::pump_ratings, upload};
use catalog_tonic_core::Error;
use catalog_tonic_core::proto::catalog_server::Catalog;
use catalog_tonic_core::proto::{
    CreateLaptopRequest, CreateLaptopResponse, RateLaptopRequest, RateLaptopResponse,
    SearchLaptopRequest, SearchLaptopResponse, UploadImageRequest, UploadImageResponse,
};
use core::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status, Streaming};
use uuid::Uuid;

/// gRPC service over the shared in-memory catalog, rating aggregates and
/// the image content store.
#[derive(Clone)]
pub struct CatalogService {
    config: ServerConfig,
    laptops: Arc<dyn LaptopStore>,
    images: Arc<dyn ImageStore>,
    ratings: Arc<dyn RatingStore>,
}

impl CatalogService {
    pub fn new(
        config: ServerConfig,
        laptops: Arc<dyn LaptopStore>,
        images: Arc<dyn ImageStore>,
        ratings: Arc<dyn RatingStore>,
    ) -> Self {
        Self {
            config,
            laptops,
            images,
            ratings,
        }
    }
}

#[tonic::async_trait]
impl Catalog for CatalogService {
    /// Creates a new laptop.
    ///
    /// A non-empty id must be a valid UUID; an empty id is replaced with a
    /// freshly generated one. The deadline is re-checked right before the
    /// save so a dead caller context never mutates the store.
    async fn create_laptop(
        &self,
        request: Request<CreateLaptopRequest>,
    ) -> Result<Response<CreateLaptopResponse>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let mut laptop = request
            .into_inner()
            .laptop
            .ok_or_else(|| Error::InvalidRequest {
                reason: "laptop is required".to_owned(),
            })?;

        tracing::info!(id = %laptop.id, "received a create-laptop request");

        if laptop.id.is_empty() {
            laptop.id = Uuid::new_v4().to_string();
        } else if Uuid::parse_str(&laptop.id).is_err() {
            return Err(Error::InvalidId { id: laptop.id }.into());
        }

        ctx.check()?;

        self.laptops.save(&laptop)?;
        tracing::info!(id = %laptop.id, "saved laptop");

        Ok(Response::new(CreateLaptopResponse { id: laptop.id }))
    }

    type SearchLaptopStream = Pin<Box<dyn Stream<Item = Result<SearchLaptopResponse, Status>> + Send>>;

    /// Streams every laptop matching the filter.
    ///
    /// The scan holds the store's read lock and may visit every entry, so
    /// it runs on the blocking pool; matches flow back through a bounded
    /// channel whose `blocking_send` keeps backpressure intact. Dropping
    /// the response stream cancels the scan via its guard.
    async fn search_laptop(
        &self,
        request: Request<SearchLaptopRequest>,
    ) -> Result<Response<Self::SearchLaptopStream>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let filter = request
            .into_inner()
            .filter
            .ok_or_else(|| Error::InvalidRequest {
                reason: "filter is required".to_owned(),
            })?;

        tracing::info!(?filter, "received a search-laptop request");

        let (resp_tx, resp_rx) = mpsc::channel(self.config.stream_buffer_size);
        let guard = ctx.cancellation().drop_guard();
        let laptops = Arc::clone(&self.laptops);

        tokio::task::spawn_blocking(move || {
            let scan = laptops.search(&ctx, &filter, &mut |laptop| {
                tracing::debug!(id = %laptop.id, "sending matching laptop");
                resp_tx
                    .blocking_send(Ok(SearchLaptopResponse {
                        laptop: Some(laptop),
                    }))
                    .map_err(|_| Error::Cancelled)
            });

            if let Err(err) = scan {
                tracing::debug!(%err, "search scan aborted");
                let _ = resp_tx.blocking_send(Err(err.into()));
            }
        });

        let stream = Guarded::new(ReceiverStream::new(resp_rx), guard);
        Ok(Response::new(Box::pin(stream)))
    }

    /// Receives a chunked image upload bound to an existing laptop.
    async fn upload_image(
        &self,
        request: Request<Streaming<UploadImageRequest>>,
    ) -> Result<Response<UploadImageResponse>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let mut stream = request.into_inner();

        let info = upload::read_info(&mut stream).await?;
        tracing::info!(
            laptop_id = %info.laptop_id,
            image_type = %info.image_type,
            "received an upload-image request"
        );

        if self.laptops.find(&info.laptop_id).is_none() {
            return Err(Error::NotFound {
                id: info.laptop_id,
            }
            .into());
        }

        let data = upload::read_chunks(&ctx, &mut stream).await?;
        let size = data.len();

        let id = self
            .images
            .save(&info.laptop_id, &info.image_type, data)
            .await?;
        tracing::info!(%id, size, "saved image");

        Ok(Response::new(UploadImageResponse {
            id,
            size: size as u32,
        }))
    }

    type RateLaptopStream = Pin<Box<dyn Stream<Item = Result<RateLaptopResponse, Status>> + Send>>;

    /// Rates laptops over a bidirectional stream.
    ///
    /// The pump answers each request immediately and in order; see
    /// [`pump_ratings`].
    async fn rate_laptop(
        &self,
        request: Request<Streaming<RateLaptopRequest>>,
    ) -> Result<Response<Self::RateLaptopStream>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let inbound = request.into_inner();

        let (resp_tx, resp_rx) = mpsc::channel(self.config.stream_buffer_size);
        tokio::spawn(pump_ratings(
            ctx,
            inbound,
            Arc::clone(&self.laptops),
            Arc::clone(&self.ratings),
            resp_tx,
        ));

        Ok(Response::new(Box::pin(ReceiverStream::new(resp_rx))))
    }
}
