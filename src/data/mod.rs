//! Data structures for rank and sample plot generation.

mod count_matrix;
mod metadata;
pub mod ranks;
mod table;

pub use count_matrix::CountMatrix;
pub use metadata::{FeatureRanks, Metadata, Variable, VariableType};
pub use ranks::load_ranks;
pub use table::{Axis, Labeled, Table};
