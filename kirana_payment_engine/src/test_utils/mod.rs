//! Helpers for setting up throwaway databases in tests. Only compiled with the `test_utils` feature
//! (or for the crate's own tests).

pub mod prepare_env;
