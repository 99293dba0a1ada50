mod eval;
mod results;
mod run;
mod train;

pub use eval::evaluate;
pub use results::ResultsLog;
pub use run::{
    run,
    RunConfig,
};
pub use train::{
    training_loop,
    RunState,
};
