use {
    super::{
        networks::{
            Actor,
            Critic,
        },
        Algorithm,
        SaveableAlgorithm,
    },
    crate::{
        components::ReplayBuffer,
        configs::PolicyConfig,
    },
    candle_core::{
        DType,
        Device,
        Result,
        Tensor,
        Var,
    },
    candle_nn::{
        AdamW,
        Optimizer,
        ParamsAdamW,
        VarMap,
    },
    rand::{
        rngs::StdRng,
        SeedableRng,
    },
    std::path::Path,
};

fn filter_by_prefix(
    varmap: &VarMap,
    prefix: &str,
) -> Vec<Var> {
    varmap
        .data()
        .lock()
        .unwrap()
        .iter()
        .filter_map(|(name, var)| name.starts_with(prefix).then_some(var.clone()))
        .collect()
}

/// Deep Deterministic Policy Gradient.
///
/// The degenerate case of the delayed twin-critic update: one critic, no
/// target smoothing, and the actor and targets move on every training
/// step.
#[allow(clippy::upper_case_acronyms)]
pub struct DDPG {
    actor: Actor,
    actor_optim: AdamW,
    critic: Critic,
    critic_optim: AdamW,
    device: Device,
    gamma: f64,
    tau: f64,
    rng: StdRng,
}

impl DDPG {
    /// The bootstrapped critic target
    /// `reward + gamma * (1 - done) * Q'(s', pi'(s'))`, detached.
    fn bootstrap_targets(
        &self,
        next_states: &Tensor,
        rewards: &Tensor,
        dones: &Tensor,
    ) -> Result<Tensor> {
        let next_actions = self.actor.target_forward(next_states)?;
        let q_target = self.critic.target_forward(next_states, &next_actions)?;
        let not_done = dones.affine(-1.0, 1.0)?;
        Ok((rewards + (not_done * (self.gamma * q_target)?)?)?.detach())
    }

    /// Snapshot of the named actor parameters, online and target.
    #[doc(hidden)]
    pub fn actor_parameters(&self) -> Vec<(String, Tensor)> {
        self.actor
            .varmap
            .data()
            .lock()
            .unwrap()
            .iter()
            .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
            .collect()
    }
}

impl Algorithm for DDPG {
    type Config = PolicyConfig;

    fn from_config(
        device: &Device,
        config: &PolicyConfig,
        size_state: usize,
        size_action: usize,
        max_action: f64,
        seed: u64,
    ) -> Result<Box<Self>> {
        let actor = Actor::new(
            device,
            DType::F64,
            &[
                (size_state, config.hidden_1_size),
                (config.hidden_1_size, config.hidden_2_size),
                (config.hidden_2_size, size_action),
            ],
            max_action,
        )?;
        let actor_optim = AdamW::new(
            filter_by_prefix(&actor.varmap, "actor"),
            ParamsAdamW {
                lr: config.actor_learning_rate,
                ..Default::default()
            },
        )?;

        let critic = Critic::new(
            device,
            DType::F64,
            &[
                (size_state + size_action, config.hidden_1_size),
                (config.hidden_1_size, config.hidden_2_size),
                (config.hidden_2_size, 1),
            ],
        )?;
        let critic_optim = AdamW::new(
            filter_by_prefix(&critic.varmap, "q"),
            ParamsAdamW {
                lr: config.critic_learning_rate,
                ..Default::default()
            },
        )?;

        Ok(Box::new(Self {
            actor,
            actor_optim,
            critic,
            critic_optim,
            device: device.clone(),
            gamma: config.gamma,
            tau: config.tau,
            rng: StdRng::seed_from_u64(seed),
        }))
    }

    fn select_action(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        self.actor.forward(&state.detach().unsqueeze(0)?)?.squeeze(0)
    }

    fn train(
        &mut self,
        buffer: &ReplayBuffer,
        batch_size: usize,
    ) -> Result<()> {
        let (states, actions, next_states, rewards, dones) =
            buffer.sample(batch_size, &mut self.rng, &self.device)?;

        let q_target = self.bootstrap_targets(&next_states, &rewards, &dones)?;
        let q = self.critic.forward(&states, &actions)?;
        let critic_loss = (q - q_target)?.sqr()?.mean_all()?;
        self.critic_optim.backward_step(&critic_loss)?;

        let actor_loss = self
            .critic
            .forward(&states, &self.actor.forward(&states)?)?
            .mean_all()?
            .neg()?;
        self.actor_optim.backward_step(&actor_loss)?;

        self.critic.track(self.tau)?;
        self.actor.track(self.tau)?;

        Ok(())
    }
}

impl SaveableAlgorithm for DDPG {
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        self.actor.varmap.save(path.join(format!("{name}-actor.safetensors")))?;
        self.critic.varmap.save(path.join(format!("{name}-critic.safetensors")))?;
        Ok(())
    }

    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        self.actor.varmap.load(path.join(format!("{name}-actor.safetensors")))?;
        self.critic.varmap.load(path.join(format!("{name}-critic.safetensors")))?;
        Ok(())
    }
}
