//! Bidirectional rating pump.

use crate::server::context::CallContext;
use crate::server::store::{LaptopStore, RatingStore};
use catalog_tonic_core::Error;
use catalog_tonic_core::proto::{RateLaptopRequest, RateLaptopResponse};
use std::sync::Arc;
use tokio::sync::mpsc;
use tonic::{Status, Streaming};

/// Pumps one rating stream: exactly one response per request, in arrival
/// order, never batched.
///
/// The loop stops cleanly at end-of-stream. It terminates the response
/// stream with an error when the laptop is unknown or the caller context
/// dies; a transport receive failure just ends the call (the client is
/// already gone).
pub async fn pump_ratings(
    ctx: CallContext,
    mut inbound: Streaming<RateLaptopRequest>,
    laptops: Arc<dyn LaptopStore>,
    ratings: Arc<dyn RatingStore>,
    resp_tx: mpsc::Sender<Result<RateLaptopResponse, Status>>,
) {
    loop {
        if let Err(err) = ctx.check() {
            let _ = resp_tx.send(Err(err.into())).await;
            return;
        }

        let req = match inbound.message().await {
            Ok(Some(req)) => req,
            // Clean end of stream.
            Ok(None) => return,
            Err(status) => {
                tracing::debug!(%status, "rating stream closed by transport");
                return;
            }
        };

        tracing::debug!(laptop_id = %req.laptop_id, score = req.score, "received rate-laptop request");

        if laptops.find(&req.laptop_id).is_none() {
            let err = Error::NotFound { id: req.laptop_id };
            let _ = resp_tx.send(Err(err.into())).await;
            return;
        }

        let rating = ratings.add(&req.laptop_id, req.score);
        let response = RateLaptopResponse {
            laptop_id: req.laptop_id,
            rated_count: rating.count,
            average_score: rating.sum / f64::from(rating.count),
        };

        if resp_tx.send(Ok(response)).await.is_err() {
            // Receiver gone: the client disconnected mid-stream.
            return;
        }
    }
}
