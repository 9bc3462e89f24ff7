pub mod headers;
pub mod method;
pub mod response;

pub use headers::{HeaderItem, Headers};
pub use method::RequestMethod;
pub use response::{Failure, Progress, RawResponse, ResponseEntity};
