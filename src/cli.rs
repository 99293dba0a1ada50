use {
    crate::{
        agents::PolicyKind,
        configs::{
            PolicyConfig,
            TrainConfig,
        },
        engines::RunConfig,
    },
    clap::{
        Parser,
        ValueEnum,
    },
    std::path::PathBuf,
    tracing::Level,
};

#[derive(ValueEnum, Debug, Clone)]
pub enum EnvName {
    Pendulum,
    PointMass,
}
impl EnvName {
    pub fn name(&self) -> &str {
        match self {
            EnvName::Pendulum => "pendulum",
            EnvName::PointMass => "point_mass",
        }
    }
}

#[derive(ValueEnum, Debug, Clone)]
pub enum PolicyArg {
    Td3,
    Ddpg,
    OurDdpg,
}
impl PolicyArg {
    pub fn kind(&self) -> PolicyKind {
        match self {
            PolicyArg::Td3 => PolicyKind::Td3,
            PolicyArg::Ddpg => PolicyKind::Ddpg,
            PolicyArg::OurDdpg => PolicyKind::OurDdpg,
        }
    }
}

#[derive(ValueEnum, Debug, Clone)]
pub enum Loglevel {
    Error, // put these only during active debugging and then downgrade later
    Warn,  // main events in the program
    Info,  // all the little details
    None,  // don't log anything
}
impl Loglevel {
    pub fn level(&self) -> Option<Level> {
        match self {
            Loglevel::Error => Some(Level::ERROR),
            Loglevel::Warn => Some(Level::WARN),
            Loglevel::Info => Some(Level::INFO),
            Loglevel::None => None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The policy variant to train.
    #[arg(long, value_enum, default_value_t = PolicyArg::Td3)]
    pub policy: PolicyArg,

    /// The environment to train on.
    #[arg(long, value_enum, default_value_t = EnvName::Pendulum)]
    pub env: EnvName,

    /// Master seed for the environment, noise sources and buffer sampling.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Number of initial steps with uniformly random actions.
    #[arg(long, default_value_t = 25_000)]
    pub start_timesteps: usize,

    /// How often (in environment steps) the policy is evaluated.
    #[arg(long, default_value_t = 5_000)]
    pub eval_freq: usize,

    /// Total number of environment steps.
    #[arg(long, default_value_t = 1_000_000)]
    pub max_timesteps: usize,

    /// Std of the Gaussian exploration noise, relative to the action range.
    #[arg(long, default_value_t = 0.1)]
    pub expl_noise: f64,

    /// Batch size for both the actor and critic updates.
    #[arg(long, default_value_t = 256)]
    pub batch_size: usize,

    /// Capacity of the replay buffer.
    #[arg(long, default_value_t = 1_000_000)]
    pub buffer_capacity: usize,

    /// Discount factor.
    #[arg(long, default_value_t = 0.99)]
    pub discount: f64,

    /// Target network update rate.
    #[arg(long, default_value_t = 0.005)]
    pub tau: f64,

    /// Std of the noise added to target-policy actions during the critic
    /// update, relative to the action range.
    #[arg(long, default_value_t = 0.2)]
    pub policy_noise: f64,

    /// Clip bound on the target-policy noise, relative to the action range.
    #[arg(long, default_value_t = 0.5)]
    pub noise_clip: f64,

    /// Number of critic updates per delayed actor update.
    #[arg(long, default_value_t = 2)]
    pub policy_freq: usize,

    /// Save model parameters at every evaluation tick.
    #[arg(long)]
    pub save_model: bool,

    /// Checkpoint name to load before training; "default" uses the run name.
    #[arg(long)]
    pub load_model: Option<String>,

    /// Directory for model checkpoints.
    #[arg(long, default_value = "./models")]
    pub model_dir: PathBuf,

    /// Directory for result files.
    #[arg(long, default_value = "./results")]
    pub results_dir: PathBuf,

    /// Setup logging.
    #[arg(long, value_enum, default_value_t = Loglevel::Warn)]
    pub log: Loglevel,
}

impl Args {
    /// Variant defaults for the network/optimizer settings, with the
    /// update-rule knobs taken from the command line.
    pub fn policy_config(&self) -> PolicyConfig {
        let mut config = match self.policy {
            PolicyArg::Td3 => PolicyConfig::td3(),
            PolicyArg::Ddpg => PolicyConfig::ddpg(),
            PolicyArg::OurDdpg => PolicyConfig::our_ddpg(),
        };
        config.gamma = self.discount;
        config.tau = self.tau;
        config.policy_noise = self.policy_noise;
        config.noise_clip = self.noise_clip;
        if let PolicyArg::Td3 = self.policy {
            config.policy_delay = self.policy_freq;
        }
        config
    }

    pub fn train_config(&self) -> TrainConfig {
        TrainConfig {
            max_steps: self.max_timesteps,
            start_steps: self.start_timesteps,
            eval_freq: self.eval_freq,
            eval_episodes: 10,
            expl_noise: self.expl_noise,
            batch_size: self.batch_size,
            buffer_capacity: self.buffer_capacity,
            seed: self.seed,
        }
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            kind: self.policy.kind(),
            env_name: self.env.name().to_owned(),
            results_dir: self.results_dir.clone(),
            model_dir: self.model_dir.clone(),
            save_model: self.save_model,
            load_model: self.load_model.clone(),
        }
    }
}
