//! Integration tests: sources → optimizer → transfers, end to end.

mod fixtures;
mod mock_sources;
mod pipeline;
