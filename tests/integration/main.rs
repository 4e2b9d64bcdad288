//! End-to-end tests for the fetch → evaluate → persist → deliver run.

mod mock_provider;
mod pipeline;
