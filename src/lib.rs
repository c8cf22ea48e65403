//! This crate provides a projection server. It serves precomputed two dimensional projections of
//! labelled datasets, such as UMAP or t-SNE embeddings, to a browser-based user study, and
//! forwards the study's results to a mail backup collaborator.
//!
//! Datasets live in a directory store. Each dataset is a directory holding a label file, one
//! [NumPy NPY](https://numpy.org/devdocs/reference/generated/numpy.lib.format.html) file per
//! projection and optional JSON annotation records. A projection is served together with its
//! dataset's labels and any annotations that could be read; a broken annotation is dropped with a
//! warning rather than failing the request.
//!
//! The projection server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [ndarray] provides [NumPy](https://numpy.org)-like n-dimensional arrays, used here to
//!   reorder decoded NPY data into rows.

pub mod annotations;
pub mod app;
pub mod app_state;
pub mod array;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod json_body;
pub mod metrics;
pub mod models;
pub mod npy;
pub mod resolver;
pub mod server;
pub mod sink;
pub mod submission;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
