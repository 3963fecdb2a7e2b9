//! Backend job API: submission, event streaming, result retrieval and cancellation.

mod client;
mod sse;
mod stream;
mod types;

pub use client::{JobApi, JobClient};
pub(crate) use client::parse_base_url;
pub use sse::{decode_event_stream, SseDecoder, MAX_LINE_BYTES};
pub use stream::{EventFrames, EventSource, HttpEventSource, JobStream, StreamHandler, Subscription};
pub use types::{
    Article, CreateJobResponse, JobEvent, JobKind, GENERIC_FAILURE_MESSAGE, SCRAPE_ENDPOINT,
};

#[cfg(test)]
pub use client::MockJobApi;
