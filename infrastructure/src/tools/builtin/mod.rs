//! Built-in tool sessions

mod math;

pub use math::{MATH_SESSION_ID, MathSession};
