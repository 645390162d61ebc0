// tests/property/no_overlap.rs

use std::collections::BTreeMap;

use assetpipe::engine::{
    BindingSpec, BindingState, CoreCommand, CoreRuntime, PassOutcome, RuntimeEvent,
    RuntimeOptions, TriggerReason,
};
use proptest::prelude::*;

const BINDINGS: [&str; 3] = ["css", "js", "html"];

#[derive(Debug, Clone)]
enum Op {
    Trigger(usize),
    Complete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..BINDINGS.len()).prop_map(Op::Trigger),
        (0..BINDINGS.len()).prop_map(Op::Complete),
    ]
}

fn core(queue: [bool; 3]) -> CoreRuntime {
    let specs = BINDINGS.iter().zip(queue).map(|(name, queue)| BindingSpec {
        name: name.to_string(),
        target: name.to_string(),
        queue,
    });
    CoreRuntime::new(specs, RuntimeOptions::default())
}

proptest! {
    /// Whatever the interleaving of triggers and completions, a binding
    /// never has two passes in flight and never holds more than one
    /// follow-up.
    #[test]
    fn one_pass_per_binding(
        queue in any::<[bool; 3]>(),
        ops in proptest::collection::vec(op(), 1..80),
    ) {
        let mut core = core(queue);
        let mut in_flight: BTreeMap<String, u32> = BTreeMap::new();
        let mut last_id = 0u64;

        for op in ops {
            let event = match op {
                Op::Trigger(i) => RuntimeEvent::BindingTriggered {
                    binding: BINDINGS[i].to_string(),
                    reason: TriggerReason::FileWatch,
                },
                Op::Complete(i) => {
                    let name = BINDINGS[i];
                    // Only running bindings complete.
                    if core.state_of(name) == Some(BindingState::Idle) {
                        continue;
                    }
                    *in_flight.entry(name.to_string()).or_default() -= 1;
                    RuntimeEvent::PassCompleted {
                        binding: name.to_string(),
                        outcome: PassOutcome::Success,
                    }
                }
            };

            let step = core.step(event);
            prop_assert!(step.keep_running);

            for command in step.commands {
                if let CoreCommand::DispatchPass(pass) = command {
                    prop_assert!(pass.pass_id > last_id);
                    last_id = pass.pass_id;
                    prop_assert_eq!(&pass.target, &pass.binding);
                    *in_flight.entry(pass.binding.clone()).or_default() += 1;
                }
            }

            for (i, name) in BINDINGS.iter().enumerate() {
                let running = in_flight.get(*name).copied().unwrap_or(0);
                prop_assert!(running <= 1, "{} has {} passes in flight", name, running);
                let state_running = core.state_of(name) != Some(BindingState::Idle);
                prop_assert_eq!(state_running, running == 1);
                if !queue[i] {
                    prop_assert!(!core.has_queued(name));
                }
                if core.has_queued(name) {
                    prop_assert!(state_running);
                }
            }
        }
    }
}
