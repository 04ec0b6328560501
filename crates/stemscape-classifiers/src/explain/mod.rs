//! Per-feature attributions for forest predictions.
//!
//! [`TreeExplainer`] computes path-dependent TreeSHAP values for a fitted
//! [`crate::models::RandomForestClassifier`]. Results always come back as a
//! fixed-shape [`ShapValues`] (samples x features x classes);
//! [`ShapValues::positive_class`] is the one place that picks the slice and
//! baseline reported for the stemness index.

mod path;
mod tree_explainer;
mod values;

pub use path::PathElement;
pub use tree_explainer::TreeExplainer;
pub use values::{PositiveClassShap, ShapValues};
