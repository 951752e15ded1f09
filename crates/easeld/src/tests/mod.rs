//! Test suites for the backend.

pub(crate) mod support;
