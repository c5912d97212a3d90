//! Pipeline-level tests and shared test doubles.

pub(crate) mod mocks;
