//! Plain-text panels for analysis results, transcripts and generation
//! progress. Display only.

pub mod render;

pub use render::*;
