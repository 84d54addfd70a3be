//! Turning free-form queries into deduplicated video collections.

mod query;
mod resolver;
mod result;

pub use query::Query;
pub use resolver::{BatchOutcome, QueryResolver, ResolveError, SkippedQuery};
pub use result::{AggregateError, QueryResult, QueryResultKind};
