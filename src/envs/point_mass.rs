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
    std::ops::RangeInclusive,
};

/// A bounded 2-D point mass steered toward a goal.
///
/// The agent observes its own position and the goal position and applies a
/// bounded displacement each step. Reaching the goal radius terminates the
/// episode; otherwise the episode is truncated at the time limit. The
/// terminal step can coincide with the time limit, which exercises the
/// terminated-and-truncated edge case downstream.
pub struct PointMassEnv {
    config: PointMassConfig,
    x: f64,
    y: f64,
    goal_x: f64,
    goal_y: f64,
    timestep: usize,
    rng: StdRng,
}

#[derive(Clone, Debug, Serialize)]
pub struct PointMassConfig {
    pub width: f64,
    pub height: f64,
    pub step_size: f64,
    pub goal_radius: f64,
    pub timelimit: usize,
}
impl Default for PointMassConfig {
    fn default() -> Self {
        Self {
            width: 5.0,
            height: 5.0,
            step_size: 1.0,
            goal_radius: 0.5,
            timelimit: 30,
        }
    }
}

/// A displacement applied to the point mass.
#[derive(Clone, Debug)]
pub struct PointMassAction {
    pub dx: f64,
    pub dy: f64,
}
impl VectorConvertible for PointMassAction {
    fn from_vec(value: Vec<f64>) -> Self {
        Self {
            dx: value[0],
            dy: value[1],
        }
    }
    fn to_vec(value: Self) -> Vec<f64> {
        vec![value.dx, value.dy]
    }
}
impl TensorConvertible for PointMassAction {
    fn from_tensor(value: Tensor) -> Self {
        Self::from_vec(value.to_vec1::<f64>().unwrap())
    }
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        Tensor::new(&[value.dx, value.dy], device)
    }
}
impl Sampleable for PointMassAction {
    fn sample(
        rng: &mut dyn RngCore,
        domain: &[RangeInclusive<f64>],
    ) -> Self {
        Self {
            dx: rng.sample(Uniform::new_inclusive(*domain[0].start(), *domain[0].end())),
            dy: rng.sample(Uniform::new_inclusive(*domain[1].start(), *domain[1].end())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PointMassObservation {
    pub x: f64,
    pub y: f64,
    pub goal_x: f64,
    pub goal_y: f64,
}
impl VectorConvertible for PointMassObservation {
    fn from_vec(value: Vec<f64>) -> Self {
        Self {
            x: value[0],
            y: value[1],
            goal_x: value[2],
            goal_y: value[3],
        }
    }
    fn to_vec(value: Self) -> Vec<f64> {
        vec![value.x, value.y, value.goal_x, value.goal_y]
    }
}
impl TensorConvertible for PointMassObservation {
    fn from_tensor(value: Tensor) -> Self {
        Self::from_vec(value.to_vec1::<f64>().unwrap())
    }
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> candle_core::Result<Tensor> {
        Tensor::new(&[value.x, value.y, value.goal_x, value.goal_y], device)
    }
}

impl PointMassEnv {
    fn observation(&self) -> PointMassObservation {
        PointMassObservation {
            x: self.x,
            y: self.y,
            goal_x: self.goal_x,
            goal_y: self.goal_y,
        }
    }

    fn distance_to_goal(&self) -> f64 {
        (self.x - self.goal_x).hypot(self.y - self.goal_y)
    }
}

impl Environment for PointMassEnv {
    type Config = PointMassConfig;
    type Action = PointMassAction;
    type Observation = PointMassObservation;

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn new(config: Self::Config) -> Result<Box<Self>> {
        Ok(Box::new(Self {
            x: 0.0,
            y: 0.0,
            goal_x: config.width,
            goal_y: config.height,
            timestep: 0,
            rng: StdRng::seed_from_u64(0),
            config,
        }))
    }

    fn reset(
        &mut self,
        seed: u64,
    ) -> Result<Self::Observation> {
        self.rng = StdRng::seed_from_u64(seed);
        self.x = self.rng.sample(Uniform::new_inclusive(0.0, self.config.width));
        self.y = self.rng.sample(Uniform::new_inclusive(0.0, self.config.height));
        // Resample the goal until the start is outside the goal radius.
        loop {
            self.goal_x = self.rng.sample(Uniform::new_inclusive(0.0, self.config.width));
            self.goal_y = self.rng.sample(Uniform::new_inclusive(0.0, self.config.height));
            if self.distance_to_goal() > self.config.goal_radius {
                break;
            }
        }
        self.timestep = 0;
        Ok(self.observation())
    }

    fn step(
        &mut self,
        action: Self::Action,
    ) -> Result<Step<Self::Observation, Self::Action>> {
        let dx = action.dx.clamp(-self.config.step_size, self.config.step_size);
        let dy = action.dy.clamp(-self.config.step_size, self.config.step_size);
        self.x = (self.x + dx).clamp(0.0, self.config.width);
        self.y = (self.y + dy).clamp(0.0, self.config.height);
        self.timestep += 1;

        let distance = self.distance_to_goal();
        Ok(Step {
            observation: self.observation(),
            action,
            reward: -distance,
            terminated: distance <= self.config.goal_radius,
            truncated: self.timestep >= self.config.timelimit,
        })
    }

    fn action_space(&self) -> Vec<usize> {
        vec![2]
    }

    fn action_domain(&self) -> Vec<RangeInclusive<f64>> {
        vec![
            -self.config.step_size..=self.config.step_size,
            -self.config.step_size..=self.config.step_size,
        ]
    }

    fn observation_space(&self) -> Vec<usize> {
        vec![4]
    }

    fn observation_domain(&self) -> Vec<RangeInclusive<f64>> {
        vec![
            0.0..=self.config.width,
            0.0..=self.config.height,
            0.0..=self.config.width,
            0.0..=self.config.height,
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
    fn terminates_on_reaching_the_goal() {
        let mut env = *PointMassEnv::new(Default::default()).unwrap();
        let obs = env.reset(3).unwrap();
        // Walk straight at the goal in capped steps.
        let mut step;
        let (mut x, mut y) = (obs.x, obs.y);
        loop {
            let dx = (obs.goal_x - x).clamp(-1.0, 1.0);
            let dy = (obs.goal_y - y).clamp(-1.0, 1.0);
            step = env.step(PointMassAction { dx, dy }).unwrap();
            x = step.observation.x;
            y = step.observation.y;
            if step.terminated || step.truncated {
                break;
            }
        }
        assert!(step.terminated);
    }

    #[test]
    fn positions_stay_within_bounds() {
        let mut env = *PointMassEnv::new(Default::default()).unwrap();
        env.reset(11).unwrap();
        let domain = env.observation_domain();
        for _ in 0..10 {
            let step = env.step(PointMassAction { dx: -10.0, dy: 10.0 }).unwrap();
            assert!(step.observation.x >= 0.0);
            assert!(step.observation.y <= 5.0);
            let obs = PointMassObservation::to_vec(env.current_observation());
            for (value, range) in obs.iter().zip(&domain) {
                assert!(range.contains(value), "{value} outside {range:?}");
            }
        }
    }
}
