mod policy;
mod train;

pub use policy::PolicyConfig;
pub use train::TrainConfig;
