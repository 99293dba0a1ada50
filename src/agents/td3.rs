use {
    super::{
        networks::{
            Actor,
            TwinCritic,
        },
        Algorithm,
        SaveableAlgorithm,
    },
    crate::{
        components::{
            GaussianNoise,
            ReplayBuffer,
        },
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

/// Twin Delayed DDPG.
///
/// Two critics are trained against the shared clipped double-critic target
/// every step; the actor and all target networks move only every
/// `policy_delay` steps. The smoothing noise added to target actions keeps
/// the critics from exploiting sharp errors in the target actor.
#[allow(clippy::upper_case_acronyms)]
pub struct TD3 {
    actor: Actor,
    actor_optim: AdamW,
    critic: TwinCritic,
    critic_optim: AdamW,
    device: Device,
    gamma: f64,
    tau: f64,
    max_action: f64,
    noise_clip: f64,
    policy_delay: usize,
    update_counter: usize,
    smoothing: GaussianNoise,
    rng: StdRng,
    size_action: usize,
}

impl TD3 {
    /// Smoothed target-policy actions for a batch of next states.
    ///
    /// The smoothing noise is clipped before being added, and the sum is
    /// clamped back into the valid action range.
    #[doc(hidden)]
    pub fn smoothed_target_actions(
        &mut self,
        next_states: &Tensor,
    ) -> Result<Tensor> {
        let batch_size = next_states.dims()[0];
        let noise = Tensor::from_vec(
            self.smoothing.sample(batch_size * self.size_action),
            (batch_size, self.size_action),
            &self.device,
        )?
        .clamp(-self.noise_clip, self.noise_clip)?;

        (self.actor.target_forward(next_states)? + noise)?
            .clamp(-self.max_action, self.max_action)
    }

    /// The bootstrapped critic target
    /// `reward + gamma * (1 - done) * min(Q1', Q2')`, detached so it is
    /// never differentiated through.
    #[doc(hidden)]
    pub fn bootstrap_targets(
        &self,
        next_states: &Tensor,
        next_actions: &Tensor,
        rewards: &Tensor,
        dones: &Tensor,
    ) -> Result<Tensor> {
        let (q1_target, q2_target) = self.critic.target_forward(next_states, next_actions)?;
        let q_target = q1_target.minimum(&q2_target)?;
        let not_done = dones.affine(-1.0, 1.0)?;
        Ok((rewards + (not_done * (self.gamma * q_target)?)?)?.detach())
    }

    /// Raw target-critic estimates, exposed for inspecting the
    /// min-of-two clipping.
    #[doc(hidden)]
    pub fn target_q(
        &self,
        next_states: &Tensor,
        next_actions: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        self.critic.target_forward(next_states, next_actions)
    }

    /// How many training steps have been applied so far.
    #[doc(hidden)]
    pub fn update_counter(&self) -> usize {
        self.update_counter
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

    /// Snapshot of the named critic parameters, online and target.
    #[doc(hidden)]
    pub fn critic_parameters(&self) -> Vec<(String, Tensor)> {
        self.critic
            .varmap
            .data()
            .lock()
            .unwrap()
            .iter()
            .map(|(name, var)| (name.clone(), var.as_tensor().clone()))
            .collect()
    }
}

impl Algorithm for TD3 {
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

        let critic = TwinCritic::new(
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
            max_action,
            // Smoothing noise and its clip are scaled w.r.t. the action range.
            noise_clip: config.noise_clip * max_action,
            policy_delay: config.policy_delay,
            update_counter: 0,
            smoothing: GaussianNoise::new(config.policy_noise * max_action, seed.wrapping_add(1))?,
            rng: StdRng::seed_from_u64(seed),
            size_action,
        }))
    }

    fn select_action(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        // Candle assumes a batch dimension, so a single state is un- and
        // resqueezed around the forward pass.
        self.actor.forward(&state.detach().unsqueeze(0)?)?.squeeze(0)
    }

    fn train(
        &mut self,
        buffer: &ReplayBuffer,
        batch_size: usize,
    ) -> Result<()> {
        let (states, actions, next_states, rewards, dones) =
            buffer.sample(batch_size, &mut self.rng, &self.device)?;

        let next_actions = self.smoothed_target_actions(&next_states)?;
        let q_target = self.bootstrap_targets(&next_states, &next_actions, &rewards, &dones)?;

        let (q1, q2) = self.critic.forward(&states, &actions)?;
        let critic_loss =
            ((q1 - &q_target)?.sqr()?.mean_all()? + (q2 - &q_target)?.sqr()?.mean_all()?)?;
        self.critic_optim.backward_step(&critic_loss)?;

        self.update_counter += 1;
        if self.update_counter % self.policy_delay == 0 {
            let actor_loss = self
                .critic
                .q1_forward(&states, &self.actor.forward(&states)?)?
                .mean_all()?
                .neg()?;
            self.actor_optim.backward_step(&actor_loss)?;

            self.critic.track(self.tau)?;
            self.actor.track(self.tau)?;
        }

        Ok(())
    }
}

impl SaveableAlgorithm for TD3 {
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
