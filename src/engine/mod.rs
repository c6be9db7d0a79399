pub mod assembler;
pub mod earnings;
pub mod filter;
pub mod sequencer;

pub use assembler::build_route;
pub use earnings::{earnings_for_stop_count, estimate_earnings};
pub use filter::filter_stops;
pub use sequencer::sequence;
