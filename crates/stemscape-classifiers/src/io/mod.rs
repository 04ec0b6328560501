pub mod sample_table;

pub use sample_table::{load_sample_table, source_name};
