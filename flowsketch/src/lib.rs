//! flowsketch: streaming top-k detection and rendezvous routing tables
//!
//! Two self-contained, single-owner cores for high-throughput
//! traffic-routing and telemetry pipelines:
//!
//! - [`HeavyKeeper`]: a probabilistic top-k estimator that tracks the most
//!   frequent keys of an unbounded stream in bounded memory.
//! - [`RendezvousTable`] and [`WeightedRendezvousTable`]: precomputed
//!   highest-random-weight lookup tables that map keys to members of a
//!   dynamic node set with minimal reassignment on membership change.
//!
//! Both cores are built on a single seeded 64-bit hash and share no state;
//! neither performs I/O or internal synchronisation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod common;
pub mod frequency;
pub mod routing;

pub use common::{Result, SketchError};
pub use frequency::HeavyKeeper;
pub use routing::{RendezvousTable, WeightedRendezvousTable};
