// Public API of the text-matching subsystem.

mod matcher;
mod normalize;

pub use matcher::{match_score, similarity};
pub use normalize::normalize;
