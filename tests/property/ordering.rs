//! Plan ordering properties

use super::fixtures::{aggregate_shape, context};
use aggregate_change::{Action, ActionKind, ChangePlanner};
use proptest::prelude::*;

#[test]
fn test_insert_plan_covers_every_entity() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&aggregate_shape(), |shape| {
            let actions = ChangePlanner::new(context()).insert(shape.build()).unwrap();

            prop_assert_eq!(actions[0].kind(), ActionKind::InsertRoot);
            prop_assert_eq!(actions.len(), 1 + shape.child_count());
            for (index, action) in actions.iter().enumerate().skip(1) {
                prop_assert_eq!(action.kind(), ActionKind::Insert);
                let dependency = action.depends_on().map(|d| d.index());
                prop_assert!(matches!(dependency, Some(d) if d < index));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_update_plan_phases() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&aggregate_shape(), |mut shape| {
            shape.id = Some(shape.id.unwrap_or(1));
            let actions = ChangePlanner::new(context()).update(shape.build()).unwrap();

            let update = actions
                .iter()
                .position(|a| a.kind() == ActionKind::UpdateRoot)
                .unwrap();
            prop_assert!(actions[..update].iter().all(|a| a.kind() == ActionKind::Delete));
            prop_assert!(actions[update + 1..]
                .iter()
                .all(|a| a.kind() == ActionKind::Insert));
            prop_assert_eq!(actions.len() - update - 1, shape.child_count());

            // A delete never precedes one whose path it contains
            let paths: Vec<Vec<String>> = actions[..update]
                .iter()
                .map(|a| match a {
                    Action::Delete { path, .. } => path.segments().to_vec(),
                    _ => Vec::new(),
                })
                .collect();
            for (i, earlier) in paths.iter().enumerate() {
                for later in &paths[i + 1..] {
                    prop_assert!(!(later.len() > earlier.len() && later.starts_with(earlier)));
                }
            }

            for action in &actions[update + 1..] {
                let dependency = action.depends_on().map(|d| d.index());
                prop_assert!(matches!(dependency, Some(d) if d >= update));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_planning_is_deterministic() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&aggregate_shape(), |shape| {
            let planner = ChangePlanner::new(context());
            let first: Vec<String> = planner
                .save(shape.build())
                .unwrap()
                .iter()
                .map(Action::to_string)
                .collect();
            let second: Vec<String> = planner
                .save(shape.build())
                .unwrap()
                .iter()
                .map(Action::to_string)
                .collect();
            prop_assert_eq!(first, second);
            Ok(())
        })
        .unwrap();
}
