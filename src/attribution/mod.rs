//! Attribution payload validation, normalization and serialization.

pub mod code;
pub mod query;
pub mod validator;
pub mod whitelist;

pub use code::Code;
pub use query::{parse_query, parse_query_no_escape, query_escape, query_unescape, QueryValues};
pub use validator::{ValidationError, Validator};
