pub mod classifier_trait;
pub mod random_forest;
pub mod tree;

pub use classifier_trait::{ClassifierModel, POSITIVE_CLASS};
pub use random_forest::RandomForestClassifier;
