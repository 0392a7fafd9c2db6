//! Wire request handling: build, execute with retry, parse, route.

mod builder;
mod executor;
mod parser;
mod router;

pub use builder::build_request;
pub use executor::execute_with_retry;
pub use parser::{parse_body, problem_from};
pub use router::{body_text, route_response};
