//! High-level catalog client.

use crate::auth::AuthInterceptor;
use bytes::Bytes;
use catalog_tonic_core::proto::catalog_client;
use catalog_tonic_core::proto::{
    CreateLaptopRequest, ImageInfo, Laptop, LaptopFilter, RateLaptopRequest, RateLaptopResponse,
    SearchLaptopRequest, UploadImageRequest, UploadImageResponse, upload_image_request,
};
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;
use tonic::{Request, Status};

/// Size of one image chunk sent during an upload.
const UPLOAD_CHUNK_SIZE: usize = 1024;

/// Convenience wrapper over the generated catalog client with the
/// authentication interceptor installed.
pub struct CatalogClient {
    inner: catalog_client::CatalogClient<InterceptedService<Channel, AuthInterceptor>>,
}

impl CatalogClient {
    pub fn new(channel: Channel, interceptor: AuthInterceptor) -> Self {
        Self {
            inner: catalog_client::CatalogClient::with_interceptor(channel, interceptor),
        }
    }

    /// Creates a laptop and returns its assigned id.
    pub async fn create_laptop(&mut self, laptop: Laptop) -> Result<String, Status> {
        let response = self
            .inner
            .create_laptop(Request::new(CreateLaptopRequest {
                laptop: Some(laptop),
            }))
            .await?;
        Ok(response.into_inner().id)
    }

    /// Collects every laptop matching the filter.
    pub async fn search_laptop(&mut self, filter: LaptopFilter) -> Result<Vec<Laptop>, Status> {
        let mut stream = self
            .inner
            .search_laptop(Request::new(SearchLaptopRequest {
                filter: Some(filter),
            }))
            .await?
            .into_inner();

        let mut laptops = Vec::new();
        while let Some(response) = stream.message().await? {
            if let Some(laptop) = response.laptop {
                laptops.push(laptop);
            }
        }
        Ok(laptops)
    }

    /// Uploads an image for a laptop, chunking the data.
    pub async fn upload_image(
        &mut self,
        laptop_id: &str,
        image_type: &str,
        data: Bytes,
    ) -> Result<UploadImageResponse, Status> {
        let mut messages = vec![UploadImageRequest {
            data: Some(upload_image_request::Data::Info(ImageInfo {
                laptop_id: laptop_id.to_owned(),
                image_type: image_type.to_owned(),
            })),
        }];
        messages.extend(data.chunks(UPLOAD_CHUNK_SIZE).map(|chunk| UploadImageRequest {
            data: Some(upload_image_request::Data::ChunkData(Bytes::copy_from_slice(
                chunk,
            ))),
        }));

        let response = self
            .inner
            .upload_image(Request::new(tokio_stream::iter(messages)))
            .await?;
        Ok(response.into_inner())
    }

    /// Rates laptops, returning one response per rating in request order.
    pub async fn rate_laptop(
        &mut self,
        ratings: Vec<RateLaptopRequest>,
    ) -> Result<Vec<RateLaptopResponse>, Status> {
        let mut stream = self
            .inner
            .rate_laptop(Request::new(tokio_stream::iter(ratings)))
            .await?
            .into_inner();

        let mut responses = Vec::new();
        while let Some(response) = stream.message().await? {
            responses.push(response);
        }
        Ok(responses)
    }
}
