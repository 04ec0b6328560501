//! stemscape-classifiers: stemness index prediction and attribution.
//!
//! This crate provides the pieces of the StemSCAPE-SI pipeline: a TSV sample
//! table reader, label and feature encoders, a random forest classifier with
//! balanced class weights, a TreeSHAP explainer for that forest, and TSV
//! report writers for per-sample attributions and feature importances.
//!
//! Every stage works on a [`data_handling::FeatureMatrix`] whose column
//! schema is fixed when the training table is encoded, so later stages can
//! reject mismatched inputs instead of silently misaligning columns.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod explain;
pub mod io;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod stats;

pub use error::{Result, StemError};
