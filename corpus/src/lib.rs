//! Turns recorded games into deduplicated training corpora.
//!
//! Positions are canonicalized to White to move, aggregated into a key to move statistics mapping that
//! remembers first observation order, filtered, and split by ratio into plain or comparison triplet outputs.

pub mod aggregator;
pub mod board_info;
pub mod canonical;
pub mod comparison;
pub mod corpus;
pub mod database;
pub mod filters;
pub mod options;
pub mod splitter;

pub use aggregator::*;
pub use board_info::*;
pub use canonical::*;
pub use comparison::*;
pub use corpus::*;
pub use database::*;
pub use filters::*;
pub use options::*;
pub use splitter::*;
