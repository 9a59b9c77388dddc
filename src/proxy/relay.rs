//! Streaming relay of an upstream body back to the caller.
//!
//! The admission permit rides inside the stream, so the slot stays taken
//! for as long as bytes are still flowing. It is given back exactly once:
//! at end-of-stream, on the first upstream read error, or when the
//! downstream side drops the body (client went away).

use axum::body::Bytes;
use futures_util::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::net::transport::{BodyStream, TransportError};
use crate::observability::metrics;
use crate::security::limits::{AdmissionController, AdmissionPermit};

/// Upstream body chunks paired with the permit that admitted them.
pub struct Relay {
    upstream: BodyStream,
    permit: Option<AdmissionPermit>,
    admission: AdmissionController,
    target: String,
    bytes: u64,
}

impl Relay {
    pub fn new(
        upstream: BodyStream,
        permit: AdmissionPermit,
        admission: AdmissionController,
        target: impl Into<String>,
    ) -> Self {
        Self {
            upstream,
            permit: Some(permit),
            admission,
            target: target.into(),
            bytes: 0,
        }
    }

    fn finish(&mut self) {
        if let Some(permit) = self.permit.take() {
            permit.release();
            metrics::set_in_flight(self.admission.in_flight());
            metrics::record_relayed_bytes(self.bytes);
        }
    }
}

impl Stream for Relay {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.permit.is_none() {
            return Poll::Ready(None);
        }

        match ready!(self.upstream.poll_next_unpin(cx)) {
            Some(Ok(chunk)) => {
                self.bytes += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                tracing::warn!(
                    target_url = %self.target,
                    bytes = self.bytes,
                    error = %e,
                    "Upstream body failed mid-relay"
                );
                metrics::record_upstream_error(e.kind());
                self.finish();
                Poll::Ready(Some(Err(e)))
            }
            None => {
                tracing::debug!(
                    target_url = %self.target,
                    bytes = self.bytes,
                    "Relay complete"
                );
                self.finish();
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        if self.permit.is_some() {
            tracing::debug!(
                target_url = %self.target,
                bytes = self.bytes,
                "Relay dropped before upstream finished"
            );
            self.finish();
        }
    }
}
