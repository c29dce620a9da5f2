//! Small helpers shared across the client.

pub mod best_effort;
pub mod format;

// Re-export commonly used functions at module level
pub use best_effort::best_effort;
pub use format::elapsed_display;
