use {
    candle_core::{
        DType,
        Device,
        Module,
        Result,
        Tensor,
    },
    candle_nn::{
        func,
        linear,
        sequential::seq,
        Activation,
        Sequential,
        VarBuilder,
        VarMap,
    },
};

/// Polyak-track the target parameters toward the online parameters:
/// `target <- tau * online + (1 - tau) * target`, elementwise, matched by
/// parameter name through the shared `VarMap`. Called with `tau = 1.0` at
/// construction to make the target an exact copy.
pub(super) fn track(
    varmap: &mut VarMap,
    vb: &VarBuilder,
    target_prefix: &str,
    online_prefix: &str,
    dims: &[(usize, usize)],
    tau: f64,
) -> Result<()> {
    for (i, &(in_dim, out_dim)) in dims.iter().enumerate() {
        let target_w = vb.get((out_dim, in_dim), &format!("{target_prefix}-fc{i}.weight"))?;
        let online_w = vb.get((out_dim, in_dim), &format!("{online_prefix}-fc{i}.weight"))?;
        varmap.set_one(
            format!("{target_prefix}-fc{i}.weight"),
            ((tau * online_w)? + ((1.0 - tau) * target_w)?)?,
        )?;

        let target_b = vb.get(out_dim, &format!("{target_prefix}-fc{i}.bias"))?;
        let online_b = vb.get(out_dim, &format!("{online_prefix}-fc{i}.bias"))?;
        varmap.set_one(
            format!("{target_prefix}-fc{i}.bias"),
            ((tau * online_b)? + ((1.0 - tau) * target_b)?)?,
        )?;
    }
    Ok(())
}

/// A three-layer MLP with relu activations and a linear head, with its
/// parameters registered under `prefix` in the enclosing `VarMap`.
fn mlp(
    vb: &VarBuilder,
    prefix: &str,
    dims: &[(usize, usize)],
) -> Result<Sequential> {
    Ok(seq()
        .add(linear(dims[0].0, dims[0].1, vb.pp(format!("{prefix}-fc0")))?)
        .add(Activation::Relu)
        .add(linear(dims[1].0, dims[1].1, vb.pp(format!("{prefix}-fc1")))?)
        .add(Activation::Relu)
        .add(linear(dims[2].0, dims[2].1, vb.pp(format!("{prefix}-fc2")))?))
}

/// The deterministic policy network and its Polyak-tracked target copy.
///
/// The tanh head is scaled by the action bound so the actor always emits
/// actions inside the valid range.
pub(super) struct Actor {
    pub(super) varmap: VarMap,
    vb: VarBuilder<'static>,
    network: Sequential,
    target_network: Sequential,
    dims: Vec<(usize, usize)>,
}

impl Actor {
    pub(super) fn new(
        device: &Device,
        dtype: DType,
        dims: &[(usize, usize)],
        max_action: f64,
    ) -> Result<Self> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, device);

        let network = mlp(&vb, "actor", dims)?.add(func(move |xs| xs.tanh()? * max_action));
        let target_network =
            mlp(&vb, "target-actor", dims)?.add(func(move |xs| xs.tanh()? * max_action));

        // This sets the two networks to be equal to each other.
        track(&mut varmap, &vb, "target-actor", "actor", dims, 1.0)?;

        Ok(Self {
            varmap,
            vb,
            network,
            target_network,
            dims: dims.to_vec(),
        })
    }

    pub(super) fn forward(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        self.network.forward(state)
    }

    pub(super) fn target_forward(
        &self,
        state: &Tensor,
    ) -> Result<Tensor> {
        self.target_network.forward(state)
    }

    pub(super) fn track(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        track(
            &mut self.varmap,
            &self.vb,
            "target-actor",
            "actor",
            &self.dims,
            tau,
        )
    }
}

/// A single Q network and its Polyak-tracked target copy.
pub(super) struct Critic {
    pub(super) varmap: VarMap,
    vb: VarBuilder<'static>,
    network: Sequential,
    target_network: Sequential,
    dims: Vec<(usize, usize)>,
}

impl Critic {
    pub(super) fn new(
        device: &Device,
        dtype: DType,
        dims: &[(usize, usize)],
    ) -> Result<Self> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, device);

        let network = mlp(&vb, "q", dims)?;
        let target_network = mlp(&vb, "target-q", dims)?;
        track(&mut varmap, &vb, "target-q", "q", dims, 1.0)?;

        Ok(Self {
            varmap,
            vb,
            network,
            target_network,
            dims: dims.to_vec(),
        })
    }

    pub(super) fn forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[action, state], 1)?;
        self.network.forward(&xs)
    }

    pub(super) fn target_forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[action, state], 1)?;
        self.target_network.forward(&xs)
    }

    pub(super) fn track(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        track(&mut self.varmap, &self.vb, "target-q", "q", &self.dims, tau)
    }
}

/// Two independent Q networks sharing one `VarMap`, with their target
/// copies. The pair backs the clipped double-critic target.
pub(super) struct TwinCritic {
    pub(super) varmap: VarMap,
    vb: VarBuilder<'static>,
    q1: Sequential,
    q2: Sequential,
    target_q1: Sequential,
    target_q2: Sequential,
    dims: Vec<(usize, usize)>,
}

impl TwinCritic {
    pub(super) fn new(
        device: &Device,
        dtype: DType,
        dims: &[(usize, usize)],
    ) -> Result<Self> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, device);

        let q1 = mlp(&vb, "q1", dims)?;
        let q2 = mlp(&vb, "q2", dims)?;
        let target_q1 = mlp(&vb, "target-q1", dims)?;
        let target_q2 = mlp(&vb, "target-q2", dims)?;

        track(&mut varmap, &vb, "target-q1", "q1", dims, 1.0)?;
        track(&mut varmap, &vb, "target-q2", "q2", dims, 1.0)?;

        Ok(Self {
            varmap,
            vb,
            q1,
            q2,
            target_q1,
            target_q2,
            dims: dims.to_vec(),
        })
    }

    pub(super) fn forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        let xs = Tensor::cat(&[action, state], 1)?;
        Ok((self.q1.forward(&xs)?, self.q2.forward(&xs)?))
    }

    /// Only the first critic steers the actor update.
    pub(super) fn q1_forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<Tensor> {
        let xs = Tensor::cat(&[action, state], 1)?;
        self.q1.forward(&xs)
    }

    pub(super) fn target_forward(
        &self,
        state: &Tensor,
        action: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        let xs = Tensor::cat(&[action, state], 1)?;
        Ok((self.target_q1.forward(&xs)?, self.target_q2.forward(&xs)?))
    }

    pub(super) fn track(
        &mut self,
        tau: f64,
    ) -> Result<()> {
        track(&mut self.varmap, &self.vb, "target-q1", "q1", &self.dims, tau)?;
        track(&mut self.varmap, &self.vb, "target-q2", "q2", &self.dims, tau)
    }
}
