// Infrastructure layer - Worker, surfaces and HTTP plumbing
pub mod canvas;
pub mod chunked_json;
pub mod config;
pub mod generator;
pub mod http_response;
pub mod memory_probe;
pub mod worker;
