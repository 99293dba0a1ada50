use {
    super::{
        evaluate,
        training_loop,
        ResultsLog,
    },
    crate::{
        agents::{
            Policy,
            PolicyKind,
        },
        configs::{
            PolicyConfig,
            TrainConfig,
        },
        envs::{
            max_action,
            Environment,
            Sampleable,
            TensorConvertible,
        },
        util::write_config,
    },
    anyhow::Result,
    candle_core::Device,
    serde::Serialize,
    std::{
        fs::create_dir_all,
        path::PathBuf,
    },
    tracing::info,
};

/// Everything about a run that is not an algorithm or schedule
/// hyperparameter: variant selection, naming and output locations.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub kind: PolicyKind,
    pub env_name: String,
    pub results_dir: PathBuf,
    pub model_dir: PathBuf,
    pub save_model: bool,
    pub load_model: Option<String>,
}

impl RunConfig {
    /// The stem shared by the results file and the model checkpoints.
    pub fn file_name(
        &self,
        seed: u64,
    ) -> String {
        format!("{}_{}_{}", self.kind, self.env_name, seed)
    }
}

fn hyperparameter_block(
    run: &RunConfig,
    policy: &PolicyConfig,
    train: &TrainConfig,
) -> String {
    format!(
        concat!(
            "Hyperparameters\n",
            "Env: {}\n",
            "Seed: {}\n",
            "Eval frequency: {}\n",
            "Number of initial exploration steps: {}\n",
            "Max env steps: {}\n",
            "Batch size: {}\n",
            "Discount factor: {}\n",
            "Target network update rate: {}\n",
            "Policy noise: {}\n",
            "Noise clip: {}\n",
            "Frequency of delayed policy updates: {}\n",
            "\n",
        ),
        run.env_name,
        train.seed,
        train.eval_freq,
        train.start_steps,
        train.max_steps,
        train.batch_size,
        policy.gamma,
        policy.tau,
        policy.policy_noise,
        policy.noise_clip,
        policy.policy_delay,
    )
}

/// Run one full training experiment.
///
/// Output directories are created eagerly and a pre-existing results file
/// is a fatal configuration error, both before any training work starts.
pub fn run<Env, Obs, Act>(
    run_config: RunConfig,
    env_config: Env::Config,
    policy_config: PolicyConfig,
    train_config: TrainConfig,
    device: &Device,
) -> Result<()>
where
    Env: Environment<Action = Act, Observation = Obs>,
    Env::Config: Clone + Serialize,
    Obs: Clone + TensorConvertible,
    Act: Clone + TensorConvertible + Sampleable,
{
    info!(
        "Policy: {}, Env: {}, Seed: {}",
        run_config.kind, run_config.env_name, train_config.seed,
    );

    create_dir_all(&run_config.results_dir)?;
    if run_config.save_model {
        create_dir_all(&run_config.model_dir)?;
    }

    let file_name = run_config.file_name(train_config.seed);
    let mut results = ResultsLog::create(
        &run_config.results_dir.join(format!("{file_name}.csv")),
        &hyperparameter_block(&run_config, &policy_config, &train_config),
    )?;
    write_config(
        &policy_config,
        run_config.results_dir.join(format!("{file_name}_policy.ron")),
    )?;
    write_config(
        &train_config,
        run_config.results_dir.join(format!("{file_name}_train.ron")),
    )?;

    let mut env = *Env::new(env_config)?;
    let size_state = env.observation_space().iter().product::<usize>();
    let size_action = env.action_space().iter().product::<usize>();

    let mut policy = Policy::new(
        run_config.kind,
        device,
        &policy_config,
        size_state,
        size_action,
        max_action(&env),
        train_config.seed,
    )?;

    if let Some(name) = &run_config.load_model {
        let name = if name == "default" { &file_name } else { name };
        info!("Loading model weights named {name} from {:?}", run_config.model_dir);
        policy.load(&run_config.model_dir, name)?;
    }

    // Evaluate the untrained policy first.
    let avg_reward = evaluate::<Env, Obs, Act>(
        &policy,
        env.config().clone(),
        train_config.seed,
        train_config.eval_episodes,
        device,
    )?;
    results.append(avg_reward, 0.0, 0, 0, train_config.seed)?;

    let checkpoint = run_config
        .save_model
        .then_some((run_config.model_dir.as_path(), file_name.as_str()));
    training_loop(
        &mut env,
        &mut policy,
        &train_config,
        &mut results,
        checkpoint,
        device,
    )?;

    if run_config.save_model {
        policy.save(&run_config.model_dir, &file_name)?;
    }

    Ok(())
}
