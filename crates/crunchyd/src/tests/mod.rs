//! Test suites for the server bootstrap, loopback serving and lifecycle.

pub(crate) mod support;
mod unit;
