//! Integration tests for the snapshot store

mod capture;
mod properties;
mod query;
mod session_lifecycle;
mod store_integration;
mod subtree_ops;
mod support;
