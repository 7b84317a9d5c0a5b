pub mod annotation;
pub mod builder;
pub mod edge;
pub mod error;
pub mod events;
pub mod graph;
pub mod location;
pub mod node;
pub mod ports;
pub mod run;
pub mod slice;
pub mod trace;
pub mod traversal;
pub mod value;
pub mod value_path;
pub mod window;
