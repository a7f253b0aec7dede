// Page layout for the CV preview: page-break calculation, paginated viewport,
// server-side block measurement and debounced recomputation.
// CPU-bound layout work must run inside tokio::task::spawn_blocking.

pub mod handlers;
pub mod page_break;
pub mod preview;
pub mod scheduler;
pub mod section_renderer;
pub mod text_metrics;
pub mod viewport;

// Re-export the public API consumed by other modules (state, handlers).
pub use page_break::LayoutConfig;
pub use scheduler::LayoutScheduler;
