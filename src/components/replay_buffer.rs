use {
    candle_core::{
        bail,
        Device,
        Result,
        Tensor,
    },
    rand::{
        distributions::Uniform,
        Rng,
    },
    unzip_n::unzip_n,
};

unzip_n!(5);

/// A single environment transition.
///
/// `done` is 1.0 only on true termination. An episode cut off by the time
/// limit stores 0.0 so that the bootstrap term is kept on truncation.
#[derive(Clone)]
struct Transition {
    state: Tensor,
    action: Tensor,
    next_state: Tensor,
    reward: f64,
    done: f64,
}

/// A fixed-capacity replay buffer for off-policy algorithms.
///
/// Implemented as a ring: the write cursor wraps around and, once the
/// buffer is full, new transitions overwrite the oldest entry. Sampling is
/// uniform *with replacement*, so a single batch may contain duplicates;
/// this keeps the per-call cost independent of buffer occupancy.
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    ptr: usize,
}
impl ReplayBuffer {
    /// Create a new replay buffer with the given fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            ptr: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Write a transition at the cursor and advance it modulo capacity.
    pub fn add(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        next_state: &Tensor,
        reward: f64,
        done: f64,
    ) {
        let transition = Transition {
            state: state.clone(),
            action: action.clone(),
            next_state: next_state.clone(),
            reward,
            done,
        };
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.ptr] = transition;
        }
        self.ptr = (self.ptr + 1) % self.capacity;
    }

    /// Sample a batch of transitions uniformly at random, with replacement.
    ///
    /// Returns the five column tensors (states, actions, next states,
    /// rewards, done flags) stacked in batch order, with shapes
    /// `(B, S)`, `(B, A)`, `(B, S)`, `(B, 1)` and `(B, 1)`.
    ///
    /// Sampling from an empty buffer is a caller contract violation and
    /// fails; the orchestrator gates training on the warm-up step count.
    #[allow(clippy::type_complexity)]
    pub fn sample(
        &self,
        batch_size: usize,
        rng: &mut impl Rng,
        device: &Device,
    ) -> Result<(Tensor, Tensor, Tensor, Tensor, Tensor)> {
        if self.buffer.is_empty() {
            bail!("cannot sample from an empty replay buffer");
        }
        let indices = Uniform::from(0..self.buffer.len());

        let (states, actions, next_states, rewards, dones) = (0..batch_size)
            .map(|_| {
                let t = &self.buffer[rng.sample(indices)];
                Ok((
                    t.state.unsqueeze(0)?,
                    t.action.unsqueeze(0)?,
                    t.next_state.unsqueeze(0)?,
                    t.reward,
                    t.done,
                ))
            })
            .collect::<Result<Vec<(Tensor, Tensor, Tensor, f64, f64)>>>()?
            .into_iter()
            .unzip_n_vec();

        Ok((
            Tensor::cat(&states, 0)?,
            Tensor::cat(&actions, 0)?,
            Tensor::cat(&next_states, 0)?,
            Tensor::from_vec(rewards, (batch_size, 1), device)?,
            Tensor::from_vec(dones, (batch_size, 1), device)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        rand::{
            rngs::StdRng,
            SeedableRng,
        },
    };

    fn add_tagged(
        buffer: &mut ReplayBuffer,
        device: &Device,
        tag: f64,
    ) {
        let state = Tensor::new(&[tag, tag, tag], device).unwrap();
        let action = Tensor::new(&[tag], device).unwrap();
        buffer.add(&state, &action, &state, tag, 0.0);
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let device = Device::Cpu;
        let mut buffer = ReplayBuffer::new(8);
        for tag in 0..11 {
            add_tagged(&mut buffer, &device, tag as f64);
        }
        assert_eq!(buffer.len(), 8);
        assert!(buffer.is_full());
        // 0, 1 and 2 were evicted in order; the cursor sits after slot 2.
        assert_eq!(buffer.ptr, 3);
        let rewards: Vec<f64> = buffer.buffer.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![8.0, 9.0, 10.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn sample_returns_requested_batch_with_replacement() {
        let device = Device::Cpu;
        let mut buffer = ReplayBuffer::new(16);
        for tag in 0..3 {
            add_tagged(&mut buffer, &device, tag as f64);
        }
        let mut rng = StdRng::seed_from_u64(0);

        let (states, actions, next_states, rewards, dones) =
            buffer.sample(32, &mut rng, &device).unwrap();
        assert_eq!(states.dims(), &[32, 3]);
        assert_eq!(actions.dims(), &[32, 1]);
        assert_eq!(next_states.dims(), &[32, 3]);
        assert_eq!(rewards.dims(), &[32, 1]);
        assert_eq!(dones.dims(), &[32, 1]);

        // Every sampled entry comes from the three stored transitions, and
        // 32 draws from 3 entries force duplicates (replacement property).
        let rewards = rewards.squeeze(1).unwrap().to_vec1::<f64>().unwrap();
        assert!(rewards.iter().all(|r| [0.0, 1.0, 2.0].contains(r)));

        // Repeated sampling visits all stored indices.
        let mut seen = [false; 3];
        for _ in 0..16 {
            let (_, _, _, rewards, _) = buffer.sample(8, &mut rng, &device).unwrap();
            for r in rewards.squeeze(1).unwrap().to_vec1::<f64>().unwrap() {
                seen[r as usize] = true;
            }
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn sample_from_empty_buffer_fails() {
        let device = Device::Cpu;
        let buffer = ReplayBuffer::new(4);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(buffer.sample(1, &mut rng, &device).is_err());
    }
}
