// ABOUTME: Property tests for the command flag encoder.
// ABOUTME: Checks the boolean, scalar, and repeated encoding rules over arbitrary inputs.

use davit::flags::{FlagSet, encode};
use proptest::prelude::*;

const KEY_PATTERN: &str = "[a-z][a-z0-9_]{0,11}";
const VALUE_PATTERN: &str = "[a-zA-Z0-9=./:-]{1,16}";

fn flag_token(key: &str) -> String {
    format!("--{}", key.replace('_', "-"))
}

proptest! {
    #[test]
    fn true_boolean_emits_exactly_one_bare_flag(key in KEY_PATTERN) {
        prop_assume!(key != "pipe" && key != "check");

        let mut flags = FlagSet::new();
        flags.set_bool(&key, true);
        let encoded = encode("cmd", &flags);

        let tokens: Vec<&str> = encoded.split_whitespace().collect();
        let flag = flag_token(&key);
        prop_assert_eq!(tokens.iter().filter(|t| **t == flag).count(), 1);
        // bare flag: nothing follows it
        prop_assert_eq!(*tokens.last().unwrap(), flag.as_str());
    }

    #[test]
    fn false_boolean_emits_nothing(key in KEY_PATTERN) {
        let mut flags = FlagSet::new();
        flags.set_bool(&key, false);
        prop_assert_eq!(encode("cmd", &flags), "cmd");
    }

    #[test]
    fn scalar_emits_one_key_value_pair(key in KEY_PATTERN, value in VALUE_PATTERN) {
        prop_assume!(key != "pipe" && key != "check");

        let mut flags = FlagSet::new();
        flags.set_scalar(&key, value.clone());
        prop_assert_eq!(encode("cmd", &flags), format!("cmd {} {}", flag_token(&key), value));
    }

    #[test]
    fn repeated_emits_n_pairs_in_element_order(
        key in KEY_PATTERN,
        values in prop::collection::vec(VALUE_PATTERN, 0..6),
    ) {
        prop_assume!(key != "pipe" && key != "check");

        let mut flags = FlagSet::new();
        flags.set_repeated(&key, values.clone());
        let encoded = encode("cmd", &flags);

        let flag = flag_token(&key);
        let expected: String = values
            .iter()
            .map(|v| format!(" {flag} {v}"))
            .collect();
        prop_assert_eq!(encoded, format!("cmd{expected}"));
    }

    #[test]
    fn reserved_keys_never_reach_the_command(value in VALUE_PATTERN) {
        let mut flags = FlagSet::new();
        flags.set_bool("pipe", true);
        flags.set_scalar("check", value);
        prop_assert_eq!(encode("cmd", &flags), "cmd");
    }

    #[test]
    fn insertion_order_is_stable(
        keys in prop::collection::hash_set(KEY_PATTERN, 1..5),
    ) {
        // distinct keys can collide once underscores become dashes
        let mut seen = std::collections::HashSet::new();
        let keys: Vec<String> = keys.into_iter()
            .filter(|k| k != "pipe" && k != "check")
            .filter(|k| seen.insert(flag_token(k)))
            .collect();

        let mut flags = FlagSet::new();
        for key in &keys {
            flags.set_bool(key, true);
        }
        let encoded = encode("cmd", &flags);
        let tokens: Vec<&str> = encoded.split_whitespace().collect();

        let mut last = 0;
        for key in &keys {
            let flag = flag_token(key);
            let pos = tokens.iter().position(|t| **t == flag).expect("flag missing");
            prop_assert!(pos >= last);
            last = pos;
        }
    }
}
