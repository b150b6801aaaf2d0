//! End-to-end tests for the retrieval pipeline.

mod answer_flow;
