use {
    crate::{
        agents::Policy,
        envs::{
            Environment,
            TensorConvertible,
        },
    },
    anyhow::Result,
    candle_core::Device,
    tracing::info,
};

/// Run a frozen policy for a fixed number of episodes and report the mean
/// return.
///
/// The evaluation environment is a fresh instance seeded at a fixed offset
/// of 100 from the training seed, so evaluation trajectories never collide
/// with the training ones. The policy is used without exploration noise
/// and is never mutated.
pub fn evaluate<Env, Obs, Act>(
    policy: &Policy,
    env_config: Env::Config,
    seed: u64,
    episodes: usize,
    device: &Device,
) -> Result<f64>
where
    Env: Environment<Action = Act, Observation = Obs>,
    Obs: Clone + TensorConvertible,
    Act: Clone + TensorConvertible,
{
    let mut env = *Env::new(env_config)?;

    let mut total_reward = 0.0;
    for episode in 0..episodes {
        let mut observation = env.reset(seed + 100 + episode as u64)?;
        loop {
            let state = <Obs>::to_tensor(observation, device)?;
            let action = policy.select_action(&state)?;
            let step = env.step(<Act>::from_tensor(action))?;

            total_reward += step.reward;
            observation = step.observation;
            if step.terminated || step.truncated {
                break;
            }
        }
    }
    let avg_reward = total_reward / episodes as f64;

    info!("Evaluation over {episodes} episodes: {avg_reward:.3}");
    Ok(avg_reward)
}
