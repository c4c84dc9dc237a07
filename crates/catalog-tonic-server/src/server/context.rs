//! Per-call deadline and cancellation tracking.

use catalog_tonic_core::{Error, Result};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;

/// Deadline and cancellation state for one inbound call.
///
/// tonic surfaces the caller's deadline as the `grpc-timeout` metadata
/// value and a client disconnect as a dropped response stream. Long-running
/// loops (the search scan, the upload loop, the rating pump) poll
/// [`check`](CallContext::check) at each iteration boundary so work stops
/// promptly once the caller context is dead, instead of running unbounded.
#[derive(Clone, Debug)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancelled: CancellationToken,
}

impl CallContext {
    /// Builds a context from the call's metadata.
    pub fn from_metadata(metadata: &MetadataMap) -> Self {
        Self {
            deadline: grpc_timeout(metadata).map(|timeout| Instant::now() + timeout),
            cancelled: CancellationToken::new(),
        }
    }

    /// Returns the token that marks this call as abandoned by its caller.
    ///
    /// Holders of a clone may cancel it; the usual wiring hands its drop
    /// guard to the response stream so that dropping the stream cancels any
    /// producer still running.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancelled.clone()
    }

    /// Fails once the caller context is dead.
    ///
    /// Cancellation wins over the deadline when both apply.
    pub fn check(&self) -> Result<()> {
        if self.cancelled.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if let Some(deadline) = self.deadline {
            if Instant::now() > deadline {
                return Err(Error::DeadlineExceeded);
            }
        }

        Ok(())
    }
}

/// Parses a `grpc-timeout` metadata value such as `"5S"` or `"100m"`.
///
/// Returns `None` for absent or malformed values; a call without a parsed
/// deadline simply has none.
fn grpc_timeout(metadata: &MetadataMap) -> Option<Duration> {
    let raw = metadata.get("grpc-timeout")?.to_str().ok()?;
    if raw.len() < 2 || !raw.is_ascii() {
        return None;
    }

    let (value, unit) = raw.split_at(raw.len() - 1);
    let value: u64 = value.parse().ok()?;
    match unit {
        "H" => Some(Duration::from_secs(value.saturating_mul(3600))),
        "M" => Some(Duration::from_secs(value.saturating_mul(60))),
        "S" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_millis(value)),
        "u" => Some(Duration::from_micros(value)),
        "n" => Some(Duration::from_nanos(value)),
        _ => None,
    }
}
