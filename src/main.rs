use {
    anyhow::Result,
    candle_core::Device,
    clap::Parser,
    td3_rl::{
        cli::{
            Args,
            EnvName,
        },
        engines::run,
        envs::{
            PendulumEnv,
            PointMassEnv,
        },
        logging::setup_logging,
    },
};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(level) = args.log.level() {
        setup_logging(&"debug.log", Some(level), Some(level))?;
    }

    let device = Device::Cpu;
    match args.env {
        EnvName::Pendulum => run::<PendulumEnv, _, _>(
            args.run_config(),
            Default::default(),
            args.policy_config(),
            args.train_config(),
            &device,
        ),
        EnvName::PointMass => run::<PointMassEnv, _, _>(
            args.run_config(),
            Default::default(),
            args.policy_config(),
            args.train_config(),
            &device,
        ),
    }
}
