//! Query preprocessing: synonym expansion and casual-query detection.
//!
//! Both are plain rule tables loaded once at startup so tests can substitute
//! fixtures; neither fails at runtime.

pub mod casual;
pub mod expand;

pub use casual::CasualResponder;
pub use expand::SynonymTable;
