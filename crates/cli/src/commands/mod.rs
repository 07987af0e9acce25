//! Command handlers for the Nearmatch CLI.

pub mod batch;
pub mod embed;
pub mod input;
pub mod matching;

// Re-export command types for convenience
pub use batch::BatchCommand;
pub use embed::EmbedCommand;
pub use matching::MatchCommand;
