#![allow(dead_code)]

pub mod logs;
pub mod mocks;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use logs::capture_logs;
#[allow(unused_imports)]
pub use mocks::{
    mock_transport, MockConnectionManager, MockServer, MockTransport, RecordingRenderer, Rendered,
    SlowTransport,
};
