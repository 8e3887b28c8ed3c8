mod subscriber;

pub use subscriber::{init_tracing, level_from_verbosity};
