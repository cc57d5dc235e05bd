//! Progress display for running tasks

pub mod reporter;
