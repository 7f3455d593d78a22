//! Property tests over random sequences of trapped operations.

use objmock::prelude::*;
use objmock_test_utils::{fresh_space, history_kinds, root_mock};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Get(u8),
    Set(u8, i64),
    Delete(u8),
    Call(i64),
    Construct,
    PrototypeOf,
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4).prop_map(Op::Get),
        (0u8..4, any::<i64>()).prop_map(|(p, v)| Op::Set(p, v)),
        (0u8..4).prop_map(Op::Delete),
        any::<i64>().prop_map(Op::Call),
        Just(Op::Construct),
        Just(Op::PrototypeOf),
    ]
}

fn name(p: u8) -> String {
    format!("p{p}")
}

proptest! {
    #[test]
    fn prop_history_grows_by_one_per_trap(ops in prop::collection::vec(any_op(), 0..30)) {
        let space = fresh_space();
        let root = root_mock(&space);
        let mut expected = Vec::new();

        for op in &ops {
            let before = root.report().unwrap().len();
            let kind = match op {
                Op::Get(p) => { root.get(&name(*p)).unwrap(); Some(AccessKind::Get) }
                Op::Set(p, v) => { root.set(&name(*p), *v).unwrap(); Some(AccessKind::Set) }
                Op::Delete(p) => { root.delete(&name(*p)).unwrap(); Some(AccessKind::Delete) }
                Op::Call(v) => { root.call(vec![Value::Int(*v)]).unwrap(); Some(AccessKind::Apply) }
                Op::Construct => { root.construct(vec![]).unwrap(); Some(AccessKind::Construct) }
                Op::PrototypeOf => { root.prototype_of().unwrap(); None }
            };
            let after = root.report().unwrap().len();
            match kind {
                Some(k) => {
                    prop_assert_eq!(after, before + 1);
                    expected.push(k);
                }
                None => prop_assert_eq!(after, before),
            }
        }

        prop_assert_eq!(history_kinds(&root.report().unwrap()), expected);
    }

    #[test]
    fn prop_auto_created_reads_are_idempotent(props in prop::collection::vec(0u8..6, 1..20)) {
        let space = fresh_space();
        let root = root_mock(&space);
        let registry = space.registry();

        for p in &props {
            let first = root.get(&name(*p)).unwrap();
            let second = root.get(&name(*p)).unwrap();
            prop_assert_eq!(&first, &second);
            let obj = first.as_mock().unwrap();
            prop_assert!(registry.handler_by_object(obj).is_ok());
        }

        let mut distinct = props.clone();
        distinct.sort_unstable();
        distinct.dedup();
        // root plus one child per distinct property
        prop_assert_eq!(registry.len(), distinct.len() + 1);
    }

    #[test]
    fn prop_set_then_get_observes_value(p in 0u8..4, v in any::<i64>()) {
        let space = fresh_space();
        let root = root_mock(&space);
        root.set(&name(p), v).unwrap();
        prop_assert_eq!(root.get(&name(p)).unwrap(), Value::Int(v));
        let report = root.report().unwrap();
        prop_assert!(report.property_gets()[0].was_defined);
    }

    #[test]
    fn prop_called_flag_is_monotonic(calls in prop::collection::vec(any::<bool>(), 0..20)) {
        let space = fresh_space();
        let root = root_mock(&space);
        let mut seen = false;
        for is_call in calls {
            if is_call {
                root.call(vec![]).unwrap();
                seen = true;
            } else {
                root.get("x").unwrap();
            }
            prop_assert_eq!(root.report().unwrap().is_called(), seen);
        }
    }
}
