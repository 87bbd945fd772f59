//! Client library for an API design and testing backend: cURL import,
//! endpoint folder trees, and paginated views over generated test cases.

pub mod cli;
pub mod collections;
pub mod http;
pub mod project;
pub mod storage;
pub mod testing;
