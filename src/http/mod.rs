pub mod client;
pub mod curl;
pub mod method;
