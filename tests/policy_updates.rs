use {
    candle_core::{
        Device,
        Tensor,
    },
    rand::{
        rngs::StdRng,
        Rng,
        SeedableRng,
    },
    std::collections::BTreeMap,
    td3_rl::{
        agents::{
            Algorithm,
            DDPG,
            TD3,
        },
        components::ReplayBuffer,
        configs::PolicyConfig,
    },
};

const STATE_DIM: usize = 3;
const ACTION_DIM: usize = 1;
const MAX_ACTION: f64 = 1.0;

fn small_config() -> PolicyConfig {
    PolicyConfig {
        // Large learning rates so every applied update visibly moves the
        // parameters.
        actor_learning_rate: 1e-2,
        critic_learning_rate: 1e-2,
        hidden_1_size: 8,
        hidden_2_size: 8,
        ..PolicyConfig::td3()
    }
}

fn filled_buffer(
    device: &Device,
    transitions: usize,
) -> ReplayBuffer {
    let mut rng = StdRng::seed_from_u64(99);
    let mut buffer = ReplayBuffer::new(transitions);
    for _ in 0..transitions {
        let state = Tensor::from_vec(
            (0..STATE_DIM).map(|_| rng.gen_range(-1.0..1.0)).collect(),
            STATE_DIM,
            device,
        )
        .unwrap();
        let action = Tensor::from_vec(
            (0..ACTION_DIM)
                .map(|_| rng.gen_range(-MAX_ACTION..MAX_ACTION))
                .collect(),
            ACTION_DIM,
            device,
        )
        .unwrap();
        let next_state = Tensor::from_vec(
            (0..STATE_DIM).map(|_| rng.gen_range(-1.0..1.0)).collect(),
            STATE_DIM,
            device,
        )
        .unwrap();
        buffer.add(&state, &action, &next_state, rng.gen_range(-1.0..1.0), 0.0);
    }
    buffer
}

fn by_name(params: Vec<(String, Tensor)>) -> BTreeMap<String, Vec<f64>> {
    params
        .into_iter()
        .map(|(name, tensor)| {
            (
                name,
                tensor.flatten_all().unwrap().to_vec1::<f64>().unwrap(),
            )
        })
        .collect()
}

fn batch(
    device: &Device,
    rows: usize,
    cols: usize,
    seed: u64,
) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::from_vec(
        (0..rows * cols).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        (rows, cols),
        device,
    )
    .unwrap()
}

#[test]
fn actor_and_targets_move_only_on_delayed_steps() {
    let device = Device::Cpu;
    let buffer = filled_buffer(&device, 64);
    let mut td3 = *TD3::from_config(&device, &small_config(), STATE_DIM, ACTION_DIM, MAX_ACTION, 0)
        .unwrap();

    let delay = PolicyConfig::td3().policy_delay;
    let total_calls = 5;
    let mut actor_changes = 0;
    let mut target_critic_changes = 0;
    for _ in 0..total_calls {
        let actor_before = by_name(td3.actor_parameters());
        let critics_before = by_name(td3.critic_parameters());

        td3.train(&buffer, 16).unwrap();

        let actor_after = by_name(td3.actor_parameters());
        let critics_after = by_name(td3.critic_parameters());

        if actor_before != actor_after {
            actor_changes += 1;
        }
        // Online critics must move on every call.
        for prefix in ["q1", "q2"] {
            assert!(
                critics_before
                    .iter()
                    .filter(|(name, _)| name.starts_with(prefix))
                    .any(|(name, values)| critics_after[name] != *values),
                "online critic {prefix} did not move",
            );
        }
        if critics_before
            .iter()
            .filter(|(name, _)| name.starts_with("target-"))
            .any(|(name, values)| critics_after[name] != *values)
        {
            target_critic_changes += 1;
        }
    }

    assert_eq!(td3.update_counter(), total_calls);
    assert_eq!(actor_changes, total_calls / delay);
    assert_eq!(target_critic_changes, total_calls / delay);
}

#[test]
fn polyak_update_is_exact() {
    let device = Device::Cpu;
    let buffer = filled_buffer(&device, 64);
    let config = PolicyConfig {
        policy_delay: 1,
        ..small_config()
    };
    let tau = config.tau;
    let mut td3 =
        *TD3::from_config(&device, &config, STATE_DIM, ACTION_DIM, MAX_ACTION, 0).unwrap();

    let before = by_name(td3.actor_parameters());
    td3.train(&buffer, 16).unwrap();
    let after = by_name(td3.actor_parameters());

    for (name, target_new) in after.iter().filter(|(name, _)| name.starts_with("target-")) {
        let online_name = name.trim_start_matches("target-");
        let online_new = &after[online_name];
        let target_old = &before[name];
        for ((new, online), old) in target_new.iter().zip(online_new).zip(target_old) {
            let expected = tau * online + (1.0 - tau) * old;
            assert!(
                (new - expected).abs() < 1e-10,
                "{name}: {new} != {expected}",
            );
        }
    }
}

#[test]
fn done_flag_zeroes_the_bootstrap_term() {
    let device = Device::Cpu;
    let td3 = *TD3::from_config(&device, &small_config(), STATE_DIM, ACTION_DIM, MAX_ACTION, 0)
        .unwrap();

    let next_states = batch(&device, 4, STATE_DIM, 1);
    let next_actions = batch(&device, 4, ACTION_DIM, 2);
    let rewards = batch(&device, 4, 1, 3);
    let dones = Tensor::from_vec(vec![1.0; 4], (4, 1), &device).unwrap();

    let targets = td3
        .bootstrap_targets(&next_states, &next_actions, &rewards, &dones)
        .unwrap();

    // With done = 1 the target is exactly the reward, independent of the
    // critic's estimate of the next state.
    assert_eq!(
        targets.to_vec2::<f64>().unwrap(),
        rewards.to_vec2::<f64>().unwrap(),
    );
}

#[test]
fn bootstrap_target_never_exceeds_either_critic() {
    let device = Device::Cpu;
    let config = small_config();
    let gamma = config.gamma;
    let mut td3 =
        *TD3::from_config(&device, &config, STATE_DIM, ACTION_DIM, MAX_ACTION, 0).unwrap();

    let next_states = batch(&device, 8, STATE_DIM, 4);
    let rewards = batch(&device, 8, 1, 5);
    let dones = Tensor::from_vec(vec![0.0; 8], (8, 1), &device).unwrap();

    let next_actions = td3.smoothed_target_actions(&next_states).unwrap();
    let (q1, q2) = td3.target_q(&next_states, &next_actions).unwrap();
    let targets = td3
        .bootstrap_targets(&next_states, &next_actions, &rewards, &dones)
        .unwrap();

    let targets = targets.to_vec2::<f64>().unwrap();
    let rewards = rewards.to_vec2::<f64>().unwrap();
    let q1 = q1.to_vec2::<f64>().unwrap();
    let q2 = q2.to_vec2::<f64>().unwrap();
    for i in 0..8 {
        assert!(targets[i][0] <= rewards[i][0] + gamma * q1[i][0] + 1e-12);
        assert!(targets[i][0] <= rewards[i][0] + gamma * q2[i][0] + 1e-12);
    }
}

#[test]
fn smoothed_target_actions_stay_in_range() {
    let device = Device::Cpu;
    let mut td3 = *TD3::from_config(&device, &small_config(), STATE_DIM, ACTION_DIM, MAX_ACTION, 0)
        .unwrap();

    let next_states = batch(&device, 32, STATE_DIM, 6);
    let actions = td3.smoothed_target_actions(&next_states).unwrap();
    for row in actions.to_vec2::<f64>().unwrap() {
        for a in row {
            assert!(a.abs() <= MAX_ACTION);
        }
    }
}

#[test]
fn ddpg_moves_actor_and_targets_every_call() {
    let device = Device::Cpu;
    let buffer = filled_buffer(&device, 64);
    let config = PolicyConfig {
        actor_learning_rate: 1e-2,
        critic_learning_rate: 1e-2,
        hidden_1_size: 8,
        hidden_2_size: 8,
        ..PolicyConfig::our_ddpg()
    };
    let mut ddpg =
        *DDPG::from_config(&device, &config, STATE_DIM, ACTION_DIM, MAX_ACTION, 0).unwrap();

    for _ in 0..3 {
        let before = by_name(ddpg.actor_parameters());
        ddpg.train(&buffer, 16).unwrap();
        let after = by_name(ddpg.actor_parameters());

        assert!(before
            .iter()
            .filter(|(name, _)| name.starts_with("actor"))
            .any(|(name, values)| after[name] != *values));
        assert!(before
            .iter()
            .filter(|(name, _)| name.starts_with("target-"))
            .any(|(name, values)| after[name] != *values));
    }
}
