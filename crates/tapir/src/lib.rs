//! Layered graph layout.
//!
//! The pipeline follows the classic Sugiyama stages: break cycles, assign ranks, split long
//! edges into dummy chains, reduce crossings, then assign coordinates. All stages operate on a
//! top-to-bottom coordinate system; other directions are handled by transforming before and
//! after positioning.

pub use tapir_graphlib as graphlib;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod model;

pub mod acyclic;
pub mod coordinate_system;
pub mod normalize;
pub mod order;
pub mod pipeline;
pub mod position;
pub mod rank;
pub mod util;

pub use model::{EdgeLabel, GraphLabel, NodeLabel, Point, RankDir};
pub use pipeline::layout;

pub type LayoutGraph = graphlib::Graph<NodeLabel, EdgeLabel, GraphLabel>;
