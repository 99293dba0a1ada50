use serde::Serialize;

/// Hyperparameters of the interaction/update schedule.
#[derive(Clone, Debug, Serialize)]
pub struct TrainConfig {
    // Total number of environment steps.
    pub max_steps: usize,
    // Initial steps with uniformly random actions and no training calls.
    pub start_steps: usize,
    // How often (in environment steps) the policy is evaluated.
    pub eval_freq: usize,
    // Number of rollouts per evaluation.
    pub eval_episodes: usize,
    // Std of the Gaussian exploration noise, relative to the action range.
    pub expl_noise: f64,
    // Batch size for both the actor and critic updates.
    pub batch_size: usize,
    // Capacity of the replay buffer.
    pub buffer_capacity: usize,
    // Master seed for the environment, the noise sources and sampling.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            start_steps: 25_000,
            eval_freq: 5_000,
            eval_episodes: 10,
            expl_noise: 0.1,
            batch_size: 256,
            buffer_capacity: 1_000_000,
            seed: 0,
        }
    }
}
