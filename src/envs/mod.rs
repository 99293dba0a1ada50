mod pendulum;
mod point_mass;

use {
    anyhow::Result,
    candle_core::{
        Device,
        Tensor,
    },
    rand::RngCore,
    std::ops::RangeInclusive,
};

pub use crate::envs::{
    pendulum::{
        PendulumAction,
        PendulumConfig,
        PendulumEnv,
        PendulumObservation,
    },
    point_mass::{
        PointMassAction,
        PointMassConfig,
        PointMassEnv,
        PointMassObservation,
    },
};

pub trait VectorConvertible {
    fn from_vec(value: Vec<f64>) -> Self;
    fn to_vec(value: Self) -> Vec<f64>;
}

pub trait TensorConvertible: VectorConvertible {
    fn from_tensor(value: Tensor) -> Self;
    fn to_tensor(
        value: Self,
        device: &Device,
    ) -> candle_core::Result<Tensor>;
}

pub trait Sampleable {
    fn sample(
        rng: &mut dyn RngCore,
        domain: &[RangeInclusive<f64>],
    ) -> Self;
}

/// The result of taking a step in an environment.
///
/// Termination and truncation are distinct signals: `terminated` means the
/// episode reached a true terminal state, `truncated` means it was cut off
/// by the time limit. Only true termination zeroes the bootstrap target,
/// so the two must never be conflated downstream.
#[derive(Debug)]
pub struct Step<O, A> {
    pub observation: O,
    pub action: A,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
}

pub trait Environment {
    type Config;
    type Action;
    type Observation;

    fn config(&self) -> &Self::Config;
    fn new(config: Self::Config) -> Result<Box<Self>>;
    fn reset(
        &mut self,
        seed: u64,
    ) -> Result<Self::Observation>;
    fn step(
        &mut self,
        action: Self::Action,
    ) -> Result<Step<Self::Observation, Self::Action>>;
    fn action_space(&self) -> Vec<usize>;
    fn action_domain(&self) -> Vec<RangeInclusive<f64>>;
    fn observation_space(&self) -> Vec<usize>;
    fn observation_domain(&self) -> Vec<RangeInclusive<f64>>;
    fn current_observation(&self) -> Self::Observation;
}

/// The largest action magnitude allowed by the environment.
pub fn max_action<E: Environment>(env: &E) -> f64 {
    env.action_domain()
        .iter()
        .map(|range| range.start().abs().max(range.end().abs()))
        .fold(0.0, f64::max)
}
