mod ddpg;
mod networks;
mod td3;

pub use ddpg::DDPG;
pub use td3::TD3;

use {
    crate::{
        components::ReplayBuffer,
        configs::PolicyConfig,
    },
    candle_core::{
        Device,
        Result,
        Tensor,
    },
    std::{
        fmt::Display,
        path::Path,
    },
};

/// The contract every policy variant implements: deterministic action
/// selection and a single training step against an external buffer.
pub trait Algorithm {
    type Config;

    fn from_config(
        device: &Device,
        config: &Self::Config,
        size_state: usize,
        size_action: usize,
        max_action: f64,
        seed: u64,
    ) -> Result<Box<Self>>;

    /// Deterministic forward pass of the actor on a single state.
    ///
    /// No exploration noise is added here; the caller owns exploration.
    fn select_action(
        &self,
        state: &Tensor,
    ) -> Result<Tensor>;

    /// One gradient step on a batch sampled from the buffer.
    ///
    /// The caller must not invoke this before the buffer holds at least
    /// `batch_size` transitions.
    fn train(
        &mut self,
        buffer: &ReplayBuffer,
        batch_size: usize,
    ) -> Result<()>;
}

pub trait SaveableAlgorithm: Algorithm {
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()>;

    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()>;
}

/// The policy variant selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    Td3,
    Ddpg,
    OurDdpg,
}

impl Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyKind::Td3 => write!(f, "TD3"),
            PolicyKind::Ddpg => write!(f, "DDPG"),
            PolicyKind::OurDdpg => write!(f, "OurDDPG"),
        }
    }
}

/// A closed set of policy variants behind one dispatch surface.
///
/// DDPG and OurDDPG share the degenerate single-critic update rule and
/// differ only in their configuration defaults.
pub enum Policy {
    Td3(Box<TD3>),
    Ddpg(Box<DDPG>),
    OurDdpg(Box<DDPG>),
}

impl Policy {
    pub fn new(
        kind: PolicyKind,
        device: &Device,
        config: &PolicyConfig,
        size_state: usize,
        size_action: usize,
        max_action: f64,
        seed: u64,
    ) -> Result<Self> {
        Ok(match kind {
            PolicyKind::Td3 => Self::Td3(TD3::from_config(
                device,
                config,
                size_state,
                size_action,
                max_action,
                seed,
            )?),
            PolicyKind::Ddpg => Self::Ddpg(DDPG::from_config(
                device,
                config,
                size_state,
                size_action,
                max_action,
                seed,
            )?),
            PolicyKind::OurDdpg => Self::OurDdpg(DDPG::from_config(
                device,
                config,
                size_state,
                size_action,
                max_action,
                seed,
            )?),
        })
    }

    pub fn select_action(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        match self {
            Self::Td3(alg) => alg.select_action(state),
            Self::Ddpg(alg) | Self::OurDdpg(alg) => alg.select_action(state),
        }
    }

    pub fn train(
        &mut self,
        buffer: &ReplayBuffer,
        batch_size: usize,
    ) -> Result<()> {
        match self {
            Self::Td3(alg) => alg.train(buffer, batch_size),
            Self::Ddpg(alg) | Self::OurDdpg(alg) => alg.train(buffer, batch_size),
        }
    }

    pub fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        match self {
            Self::Td3(alg) => alg.save(path, name),
            Self::Ddpg(alg) | Self::OurDdpg(alg) => alg.save(path, name),
        }
    }

    pub fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()> {
        match self {
            Self::Td3(alg) => alg.load(path, name),
            Self::Ddpg(alg) | Self::OurDdpg(alg) => alg.load(path, name),
        }
    }
}
