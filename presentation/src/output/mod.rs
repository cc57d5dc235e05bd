//! Task report rendering

pub mod console;
