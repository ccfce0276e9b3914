pub mod parser;
pub mod request_file;
