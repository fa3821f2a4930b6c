//! Support code for the `fluxgraph` binary

mod logging;
pub mod render;

pub use logging::init_logging;
pub use render::{render_dependencies, render_health, render_status, render_tree};
