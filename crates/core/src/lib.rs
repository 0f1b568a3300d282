#![forbid(unsafe_code)]

pub mod history;
pub mod model;
pub mod scheduler;
pub mod time;

pub use time::Clock;
