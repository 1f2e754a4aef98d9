//! Test utilities for GraphTx integration tests
//!
//! Provides a `TestFixture` pairing a `QueryEngine` with the in-process
//! `MemoryBackend` it runs on, so tests can drive the public API and then
//! inspect the physical operations the backend saw.

pub mod test_fixture;
