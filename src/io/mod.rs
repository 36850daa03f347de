//! Model persistence and text reports.
//!
//! Trees and forests are stored in a compact little-endian binary format
//! (see [`tree_format`]); reports are tab-separated text.

pub mod model_file;
pub mod report;
pub mod tree_format;

pub use model_file::{load_forest, load_tree, read_forest, save_forest, save_tree, write_forest};
pub use report::{
    habitable_planet_rule, write_filtered_indices, write_filtered_indices_file,
    write_purity_report, write_purity_report_file,
};
pub use tree_format::{read_tree, tree_from_bytes, tree_to_bytes, write_tree, NODE_RECORD_SIZE};
