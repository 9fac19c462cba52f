//! Client-side relation resolution.
//!
//! The store expands one relation per query, so everything beyond that is
//! joined here: collect the distinct foreign keys of a page, fetch each
//! related row with bounded concurrency and merge the rows back onto the
//! page by key.

mod collector;
mod fanout;
mod merge;
mod pipeline;

pub use collector::collect_keys;
pub use fanout::{
    FailureReason, FanOutConfig, FanOutFetcher, FanOutResult, FetchFailure,
    DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CONCURRENCY,
};
pub use merge::{merge, merge_into, resolve};
pub use pipeline::{
    EnrichedPage, EnrichmentPipeline, EnrichmentRequest, PartialEnrichmentWarning, RelationSpec,
};
