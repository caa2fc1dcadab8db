//! Integration test harness.

mod mock_transport;
mod run_flow;
