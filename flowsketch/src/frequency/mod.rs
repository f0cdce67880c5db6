//! Streaming frequency estimation

mod heavy_keeper;
mod min_heap;

pub use heavy_keeper::HeavyKeeper;
