//! Property-based tests for the job network.
//!
//! Drives the standard network with random reserve/take/finish sequences and
//! checks that job-state invariants hold after every step.

use freightyard_core::config::EngineConfig;
use freightyard_core::id::{JobId, Username};
use freightyard_core::network::Network;
use freightyard_core::test_utils::*;
use freightyard_core::validation::check_invariants;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum Op {
    Reserve { job: usize, user: usize },
    Take { job: usize, user: usize },
    Finish { job: usize, user: usize },
    /// Reserve, take and finish the job as one user.
    Cycle { job: usize, user: usize },
}

fn arb_ops(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(
        prop_oneof![
            (0..64usize, 0..3usize).prop_map(|(job, user)| Op::Reserve { job, user }),
            (0..64usize, 0..3usize).prop_map(|(job, user)| Op::Take { job, user }),
            (0..64usize, 0..3usize).prop_map(|(job, user)| Op::Finish { job, user }),
            (0..64usize, 0..3usize).prop_map(|(job, user)| Op::Cycle { job, user }),
        ],
        1..=max_ops,
    )
}

fn users() -> [Username; 3] {
    [username("alice"), username("bob"), username("carol")]
}

/// Pick a job by index from the current network order.
fn pick(net: &Network, idx: usize) -> Option<JobId> {
    let count = net.job_count();
    if count == 0 {
        return None;
    }
    net.jobs().nth(idx % count).map(|j| j.id().clone())
}

/// Apply one op, ignoring business-rule rejections.
fn apply(net: &mut Network, op: &Op, users: &[Username; 3]) {
    match *op {
        Op::Reserve { job, user } => {
            if let Some(id) = pick(net, job) {
                let _ = net.reserve(&users[user], &id);
            }
        }
        Op::Take { job, user } => {
            if let Some(id) = pick(net, job) {
                let _ = net.take(&users[user], &id);
            }
        }
        Op::Finish { job, user } => {
            if let Some(id) = pick(net, job) {
                let _ = net.finish(&users[user], &id);
            }
        }
        Op::Cycle { job, user } => {
            if let Some(id) = pick(net, job) {
                let _ = run_job(net, &users[user], &id);
            }
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// No shared tracks, no misplaced tracks, no job over the car ceiling.
    #[test]
    fn invariants_hold_under_random_ops(seed in 0..1_000u64, ops in arb_ops(60)) {
        let users = users();
        let mut net = Network::standard(EngineConfig::with_seed(seed));
        for op in &ops {
            apply(&mut net, op, &users);
            let violations = check_invariants(&net);
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);
        }
    }

    /// A second re-validation with no mutation in between changes nothing.
    #[test]
    fn revalidation_is_idempotent(seed in 0..1_000u64, ops in arb_ops(40)) {
        let users = users();
        let mut net = Network::standard(EngineConfig::with_seed(seed));
        for op in &ops {
            apply(&mut net, op, &users);
        }
        let before: Vec<_> = net.jobs().cloned().collect();
        let rv = net.revalidate();
        prop_assert!(rv.is_empty(), "{:?}", rv);
        let after: Vec<_> = net.jobs().cloned().collect();
        prop_assert_eq!(before, after);
    }

    /// Same seed and same operations give the same network.
    #[test]
    fn deterministic_replay(seed in 0..1_000u64, ops in arb_ops(40)) {
        let users = users();
        let mut a = Network::standard(EngineConfig::with_seed(seed));
        let mut b = Network::standard(EngineConfig::with_seed(seed));
        for op in &ops {
            apply(&mut a, op, &users);
            apply(&mut b, op, &users);
        }
        let jobs_a: Vec<_> = a.jobs().cloned().collect();
        let jobs_b: Vec<_> = b.jobs().cloned().collect();
        prop_assert_eq!(jobs_a, jobs_b);
        prop_assert_eq!(a.rng(), b.rng());
    }

    /// Reserved jobs keep their origin track until taken or finished.
    #[test]
    fn reserved_jobs_stay_spawned(seed in 0..1_000u64, ops in arb_ops(40)) {
        let users = users();
        let mut net = Network::standard(EngineConfig::with_seed(seed));
        for op in &ops {
            let reserved_spawned: Vec<JobId> = net
                .jobs()
                .filter(|j| j.is_reserved() && j.is_spawned())
                .map(|j| j.id().clone())
                .collect();
            apply(&mut net, op, &users);
            for id in reserved_spawned {
                if let Some(job) = net.job(&id) {
                    prop_assert!(job.is_spawned(), "{} lost its origin after {:?}", id, op);
                }
            }
        }
    }
}
