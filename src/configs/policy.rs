use serde::Serialize;

/// Hyperparameters of the actor-critic update rule.
///
/// One struct covers all policy variants; DDPG and OurDDPG ignore the
/// smoothing-noise and delay fields, which only drive the TD3 update.
#[derive(Clone, Debug, Serialize)]
pub struct PolicyConfig {
    // The learning rates for the actor and critic networks.
    pub actor_learning_rate: f64,
    pub critic_learning_rate: f64,
    // The impact of the next state's value on the current state's value.
    pub gamma: f64,
    // The rate at which the target networks track the online networks.
    pub tau: f64,
    // The number of neurons in the hidden layers of both networks.
    pub hidden_1_size: usize,
    pub hidden_2_size: usize,
    // Std of the noise added to target-policy actions, relative to the
    // action range.
    pub policy_noise: f64,
    // Clip bound on that noise, relative to the action range.
    pub noise_clip: f64,
    // Number of critic updates per delayed actor/target update.
    pub policy_delay: usize,
}

impl PolicyConfig {
    pub fn td3() -> Self {
        Self {
            actor_learning_rate: 3e-4,
            critic_learning_rate: 3e-4,
            gamma: 0.99,
            tau: 0.005,
            hidden_1_size: 256,
            hidden_2_size: 256,
            policy_noise: 0.2,
            noise_clip: 0.5,
            policy_delay: 2,
        }
    }

    /// The classic DDPG parameterization.
    pub fn ddpg() -> Self {
        Self {
            actor_learning_rate: 1e-4,
            critic_learning_rate: 1e-3,
            hidden_1_size: 400,
            hidden_2_size: 300,
            policy_delay: 1,
            ..Self::td3()
        }
    }

    /// DDPG re-tuned to match the TD3 network and optimizer settings.
    pub fn our_ddpg() -> Self {
        Self {
            policy_delay: 1,
            ..Self::td3()
        }
    }
}
