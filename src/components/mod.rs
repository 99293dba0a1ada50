mod noise;
mod replay_buffer;

pub use noise::GaussianNoise;
pub use replay_buffer::ReplayBuffer;
