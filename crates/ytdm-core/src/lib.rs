pub mod config;
pub mod logging;

pub mod downloading;
pub mod pipeline;
pub mod progress;
pub mod resolving;
pub mod sync;
pub mod tagging;
pub mod util;
pub mod youtube;
