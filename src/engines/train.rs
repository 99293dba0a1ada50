use {
    super::{
        evaluate,
        ResultsLog,
    },
    crate::{
        agents::Policy,
        components::{
            GaussianNoise,
            ReplayBuffer,
        },
        configs::TrainConfig,
        envs::{
            max_action,
            Environment,
            Sampleable,
            TensorConvertible,
        },
    },
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    std::{
        path::Path,
        time::Instant,
    },
    tracing::info,
};

/// Counters owned by the training loop.
///
/// Episode-scoped fields reset at episode boundaries; the episode index
/// and gradient-step counter are monotonic for the whole run.
#[derive(Default)]
pub struct RunState {
    pub episode_num: usize,
    pub episode_reward: f64,
    pub episode_timesteps: usize,
    pub grad_steps: usize,
}

/// The done flag stored with a transition.
///
/// An episode cut off by the time limit is not a true terminal state, so
/// truncation keeps the bootstrap term even when the environment also
/// reports termination on the same step.
pub(crate) fn done_bool(
    terminated: bool,
    truncated: bool,
) -> f64 {
    if terminated && !truncated {
        1.0
    } else {
        0.0
    }
}

/// Drive environment interaction, buffer population, per-step policy
/// updates, periodic evaluation and periodic checkpointing.
///
/// The first `start_steps` actions are sampled uniformly from the action
/// domain with no training calls; afterwards the policy acts with
/// Gaussian exploration noise and one training call is issued per step.
/// Evaluation pauses are excluded from the elapsed time written to the
/// results log by shifting the timer origin forward.
pub fn training_loop<Env, Obs, Act>(
    env: &mut Env,
    policy: &mut Policy,
    config: &TrainConfig,
    results: &mut ResultsLog,
    checkpoint: Option<(&Path, &str)>,
    device: &Device,
) -> Result<()>
where
    Env: Environment<Action = Act, Observation = Obs>,
    Env::Config: Clone,
    Obs: Clone + TensorConvertible,
    Act: Clone + TensorConvertible + Sampleable,
{
    let max_action = max_action(env);
    let action_dim = env.action_space().iter().product::<usize>();

    let mut buffer = ReplayBuffer::new(config.buffer_capacity);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut expl_noise =
        GaussianNoise::new(max_action * config.expl_noise, config.seed.wrapping_add(2))?;

    let mut observation = env.reset(config.seed)?;
    let mut run_state = RunState::default();
    let mut start = Instant::now();

    for t in 0..config.max_steps {
        run_state.episode_timesteps += 1;

        let state = <Obs>::to_tensor(observation.clone(), device)?;

        // Select an action randomly (warm-up) or according to the policy
        // with exploration noise, clipped to the action range.
        let action = if t < config.start_steps {
            <Act>::to_tensor(<Act>::sample(&mut rng, &env.action_domain()), device)?
        } else {
            let noise = Tensor::from_vec(expl_noise.sample(action_dim), action_dim, device)?;
            (policy.select_action(&state)? + noise)?.clamp(-max_action, max_action)?
        };

        let step = env.step(<Act>::from_tensor(action.clone()))?;
        let done = step.terminated || step.truncated;

        buffer.add(
            &state,
            &action,
            &<Obs>::to_tensor(step.observation.clone(), device)?,
            step.reward,
            done_bool(step.terminated, step.truncated),
        );

        observation = step.observation;
        run_state.episode_reward += step.reward;

        // Train after collecting sufficient data, one call per step.
        if t >= config.start_steps {
            policy.train(&buffer, config.batch_size)?;
            run_state.grad_steps += 1;
        }

        if done {
            info!(
                "total_t: {} episode: {} episode_t: {} reward: {:.3}",
                t + 1,
                run_state.episode_num + 1,
                run_state.episode_timesteps,
                run_state.episode_reward,
            );
            observation = env.reset(rng.gen::<u64>())?;
            run_state.episode_reward = 0.0;
            run_state.episode_timesteps = 0;
            run_state.episode_num += 1;
        }

        if (t + 1) % config.eval_freq == 0 {
            let elapsed = start.elapsed().as_secs_f64();
            let eval_started = Instant::now();

            let avg_reward = evaluate::<Env, Obs, Act>(
                policy,
                env.config().clone(),
                config.seed,
                config.eval_episodes,
                device,
            )?;
            results.append(avg_reward, elapsed, t + 1, run_state.grad_steps, config.seed)?;
            if let Some((path, name)) = checkpoint {
                policy.save(path, name)?;
            }

            // Keep the evaluation pause out of the reported training time.
            start += eval_started.elapsed();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::done_bool;

    #[test]
    fn truncation_overrides_termination() {
        assert_eq!(done_bool(false, false), 0.0);
        assert_eq!(done_bool(false, true), 0.0);
        assert_eq!(done_bool(true, false), 1.0);
        // Termination on the exact time-limit step still bootstraps.
        assert_eq!(done_bool(true, true), 0.0);
    }
}
