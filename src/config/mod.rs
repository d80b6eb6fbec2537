pub mod flow;
pub mod rules;

pub use flow::*;
pub use rules::*;
