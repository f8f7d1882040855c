pub mod code_generator;
pub mod csv;
pub mod request;

pub use code_generator::{CODE_ALPHABET, generate_code, normalize_code};
pub use csv::{quote_field, write_row};
pub use request::{ClientIpPolicy, client_ip, request_context};
