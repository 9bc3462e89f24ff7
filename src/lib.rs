//! reqflow: request orchestration over a pluggable async transport.
//!
//! Requests are described by [`RequestSpec`]s, grouped into serial or
//! parallel [`Group`]s, and driven by a [`Queue`] that runs the groups
//! strictly one after another. Responses are resolved by the first matching
//! parser in the configured [`ParserChain`]; outcomes fan out to listeners
//! at the request, group, and queue levels.

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod group;
pub mod listener;
pub mod model;
pub mod parser;
pub mod queue;
pub mod spec;
pub mod transport;

#[cfg(test)]
mod test_support;

pub mod prelude;

pub use config::Configuration;
pub use context::{HostContext, NoopContext};
pub use error::{BoxError, Error, ErrorKind, Result};
pub use executor::{ExecOutcome, ExecState, Executor};
pub use group::{Group, GroupMode, GroupOutcome};
pub use model::{Failure, Headers, Progress, RawResponse, RequestMethod, ResponseEntity};
pub use parser::{DefaultParser, ParserChain, ResponseParser, StringParser, Verdict};
pub use queue::{Queue, Unit};
pub use spec::RequestSpec;
pub use transport::{HttpTransport, HttpTransportFactory, Transport, TransportFactory};
