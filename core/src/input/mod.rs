//! Input frame model
//!
//! [`InputFrame`] is one parsed action line bound to its place in the
//! timeline; [`InputState`] is what the host input surface receives.

mod frame;
mod state;

pub use frame::{InputFrame, SourceLocation};
pub use state::InputState;
