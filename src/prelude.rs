// Common Traits and Structs
pub use crate::config::Configuration;
pub use crate::context::{HostContext, NoopContext};
pub use crate::group::{Group, GroupMode, GroupOutcome};
pub use crate::model::{
    Failure, Headers, Progress, RawResponse, RequestMethod, ResponseEntity,
};
pub use crate::parser::{DefaultParser, ParserChain, ResponseParser, StringParser, Verdict};
pub use crate::queue::{Queue, Unit};
pub use crate::spec::RequestSpec;
pub use crate::transport::{HttpTransportFactory, Transport, TransportFactory};

// Errors
pub use crate::error::{
    BoxError, Error, ErrorKind, ParserError, QueueError, Result, SetupError, TransportError,
};
