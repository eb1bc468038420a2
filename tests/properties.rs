mod common;

use common::*;
use ingress_stack::annotations::split_string_list;
use ingress_stack::naming::{ResourceNamer, MAX_NAME_LENGTH};
use ingress_stack::stack::ResourceKind;
use ingress_stack::{GroupId, Member, Rule};
use proptest::prelude::*;

fn rules_strategy() -> impl Strategy<Value = Vec<(u8, u8, u8)>> {
    // (host index, path index, service index)
    prop::collection::vec((0u8..3, 0u8..4, 0u8..3), 1..12)
}

fn member_from(rules: &[(u8, u8, u8)]) -> Member {
    rules.iter().fold(Member::new("ns-1", "ing-1"), |member, (host, path, service)| {
        let host = if *host == 0 { String::new() } else { format!("app-{}.example.com", host) };
        let path = if *path == 0 { String::new() } else { format!("/p{}", path) };
        let (name, port) = match service {
            0 => ("svc-1", "http"),
            1 => ("svc-2", "http"),
            _ => ("svc-3", "https"),
        };
        member.with_rule(Rule::new(host, path, backend(name, port)))
    })
}

proptest! {
    #[test]
    fn rule_priorities_are_contiguous(rules in rules_strategy()) {
        let stack = build(vec![member_from(&rules)]).unwrap();
        let mut priorities: Vec<i64> = stack
            .resources_of(ResourceKind::ListenerRule)
            .filter_map(|(_, resource)| resource.as_listener_rule())
            .map(|rule| rule.priority)
            .collect();
        priorities.sort_unstable();
        let expected: Vec<i64> = (1..=priorities.len() as i64).collect();
        prop_assert_eq!(priorities, expected);
        prop_assert_eq!(
            stack.count(ResourceKind::TargetGroup),
            stack.count(ResourceKind::TargetGroupBinding)
        );
    }

    #[test]
    fn builds_are_deterministic(rules in rules_strategy()) {
        let member = member_from(&rules);
        let first = build(vec![member.clone()]).unwrap().to_json().unwrap();
        let second = build(vec![member]).unwrap().to_json().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn string_lists_are_deduplicated(items in prop::collection::vec("[a-z]{1,4}", 0..10)) {
        let parsed = split_string_list(&items.join(" , "));
        for item in &items {
            prop_assert!(parsed.contains(item));
        }
        let mut sorted = parsed.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), parsed.len());
    }

    #[test]
    fn names_fit_provider_limit(namespace in "[a-z0-9-]{1,63}", name in "[a-z0-9.-]{1,63}") {
        let namer = ResourceNamer::default();
        let group = GroupId::new(namespace, name);
        prop_assert!(namer.security_group_name(&group).len() <= MAX_NAME_LENGTH);
        let binding = namer.binding_name(&group, "ns", "svc", &"http".into());
        prop_assert!(binding.len() <= MAX_NAME_LENGTH);
    }
}
