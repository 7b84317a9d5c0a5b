//! dynslice library: dynamic dependency graphs, backward slicing and value
//! paths over recorded program executions.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod server;
