use {
    super::{
        Environment,
        Sampleable,
        Step,
        TensorConvertible,
        VectorConvertible,
    },
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    rand::{
        distributions::Uniform,
        rngs::StdRng,
        Rng,
        RngCore,
        SeedableRng,
    },
    serde::Serialize,
    std::{
        f64::consts::PI,
        ops::RangeInclusive,
    },
};

/// The classic torque-limited pendulum swing-up task.
///
/// The pendulum starts at a random angle and has to be swung up and
/// balanced around the upright position. There is no terminal state, so
/// every episode ends in truncation at the time limit.
pub struct PendulumEnv {
    config: PendulumConfig,
    theta: f64,
    theta_dot: f64,
    timestep: usize,
    rng: StdRng,
}

#[derive(Clone, Debug, Serialize)]
pub struct PendulumConfig {
    pub gravity: f64,
    pub mass: f64,
    pub length: f64,
    pub dt: f64,
    pub max_torque: f64,
    pub max_speed: f64,
    pub timelimit: usize,
}
impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            gravity: 10.0,
            mass: 1.0,
            length: 1.0,
            dt: 0.05,
            max_torque: 2.0,
            max_speed: 8.0,
            timelimit: 200,
        }
    }
}

/// Torque applied to the free end of the pendulum.
#[derive(Clone, Debug)]
pub struct PendulumAction {
    pub tau: f64,
}
impl VectorConvertible for PendulumAction {
    fn from_vec(value: Vec<f64>) -> Self {
        Self { tau: value[0] }
    }
    fn to_vec(value: Self) -> Vec<f64> {
        vec![value.tau]
    }
}
impl TensorConvertible for PendulumAction {
    fn from_tensor(value: Tensor) -> Self {
        Self::from_vec(value.to_vec1::<f64>().unwrap())
    }
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        Tensor::new(&[value.tau], device)
    }
}
impl Sampleable for PendulumAction {
    fn sample(
        rng: &mut dyn RngCore,
        domain: &[RangeInclusive<f64>],
    ) -> Self {
        Self {
            tau: rng.sample(Uniform::new_inclusive(*domain[0].start(), *domain[0].end())),
        }
    }
}

/// The (x, y) coordinates of the free end plus the angular velocity.
#[derive(Clone, Debug)]
pub struct PendulumObservation {
    pub x: f64,
    pub y: f64,
    pub theta_dot: f64,
}
impl VectorConvertible for PendulumObservation {
    fn from_vec(value: Vec<f64>) -> Self {
        Self {
            x: value[0],
            y: value[1],
            theta_dot: value[2],
        }
    }
    fn to_vec(value: Self) -> Vec<f64> {
        vec![value.x, value.y, value.theta_dot]
    }
}
impl TensorConvertible for PendulumObservation {
    fn from_tensor(value: Tensor) -> Self {
        Self::from_vec(value.to_vec1::<f64>().unwrap())
    }
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        Tensor::new(&[value.x, value.y, value.theta_dot], device)
    }
}

fn angle_normalize(theta: f64) -> f64 {
    (theta + PI).rem_euclid(2.0 * PI) - PI
}

impl PendulumEnv {
    fn observation(&self) -> PendulumObservation {
        PendulumObservation {
            x: self.theta.cos(),
            y: self.theta.sin(),
            theta_dot: self.theta_dot,
        }
    }
}

impl Environment for PendulumEnv {
    type Config = PendulumConfig;
    type Action = PendulumAction;
    type Observation = PendulumObservation;

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn new(config: Self::Config) -> Result<Box<Self>> {
        Ok(Box::new(Self {
            config,
            theta: PI,
            theta_dot: 0.0,
            timestep: 0,
            rng: StdRng::seed_from_u64(0),
        }))
    }

    fn reset(
        &mut self,
        seed: u64,
    ) -> Result<Self::Observation> {
        self.rng = StdRng::seed_from_u64(seed);
        self.theta = self.rng.sample(Uniform::new_inclusive(-PI, PI));
        self.theta_dot = self.rng.sample(Uniform::new_inclusive(-1.0, 1.0));
        self.timestep = 0;
        Ok(self.observation())
    }

    fn step(
        &mut self,
        action: Self::Action,
    ) -> Result<Step<Self::Observation, Self::Action>> {
        let PendulumConfig {
            gravity: g,
            mass: m,
            length: l,
            dt,
            ..
        } = self.config;
        let torque = action.tau.clamp(-self.config.max_torque, self.config.max_torque);

        let cost = angle_normalize(self.theta).powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * torque.powi(2);

        let acceleration = 3.0 * g / (2.0 * l) * self.theta.sin() + 3.0 / (m * l * l) * torque;
        self.theta_dot =
            (self.theta_dot + acceleration * dt).clamp(-self.config.max_speed, self.config.max_speed);
        self.theta += self.theta_dot * dt;
        self.timestep += 1;

        Ok(Step {
            observation: self.observation(),
            action,
            reward: -cost,
            terminated: false,
            truncated: self.timestep >= self.config.timelimit,
        })
    }

    fn action_space(&self) -> Vec<usize> {
        vec![1]
    }

    fn action_domain(&self) -> Vec<RangeInclusive<f64>> {
        vec![-self.config.max_torque..=self.config.max_torque]
    }

    fn observation_space(&self) -> Vec<usize> {
        vec![3]
    }

    fn observation_domain(&self) -> Vec<RangeInclusive<f64>> {
        vec![
            -1.0..=1.0,
            -1.0..=1.0,
            -self.config.max_speed..=self.config.max_speed,
        ]
    }

    fn current_observation(&self) -> Self::Observation {
        self.observation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_the_timelimit_without_terminating() {
        let mut env = *PendulumEnv::new(PendulumConfig {
            timelimit: 5,
            ..Default::default()
        })
        .unwrap();
        env.reset(0).unwrap();
        for t in 0..5 {
            let step = env.step(PendulumAction { tau: 0.0 }).unwrap();
            assert!(!step.terminated);
            assert_eq!(step.truncated, t == 4);
        }
    }

    #[test]
    fn observations_stay_in_the_observation_domain() {
        let mut env = *PendulumEnv::new(Default::default()).unwrap();
        env.reset(5).unwrap();
        let domain = env.observation_domain();
        for tau in [-5.0, 5.0, -2.0, 2.0, 0.0] {
            env.step(PendulumAction { tau }).unwrap();
            let obs = PendulumObservation::to_vec(env.current_observation());
            for (value, range) in obs.iter().zip(&domain) {
                assert!(range.contains(value), "{value} outside {range:?}");
            }
        }
    }

    #[test]
    fn reset_is_reproducible() {
        let mut env = *PendulumEnv::new(Default::default()).unwrap();
        let a = env.reset(7).unwrap();
        let b = env.reset(7).unwrap();
        assert_eq!(PendulumObservation::to_vec(a), PendulumObservation::to_vec(b));
    }
}
