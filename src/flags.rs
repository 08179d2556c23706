// ABOUTME: FlagSet type and command flag encoder.
// ABOUTME: Turns named options into the --key/--key value convention the docker CLIs expect.

use std::fmt;

/// Behavior-switch names that must never be encoded as command flags.
///
/// `pipe` and `check` control how an invocation is dispatched (capture
/// output, raise on nonzero exit); they are carried by [`crate::ExecOpts`],
/// not by the command line. The encoder strips them even if a caller
/// smuggles them into a FlagSet.
pub const RESERVED_KEYS: &[&str] = &["pipe", "check"];

/// A single flag value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// Presence/absence flag: `true` emits a bare `--key`, `false` emits nothing.
    Bool(bool),
    /// One `--key value` pair.
    Scalar(String),
    /// One `--key value` pair per element, in element order.
    Repeated(Vec<String>),
}

/// An ordered set of named command-line options.
///
/// Insertion order is preserved. Re-inserting an existing key updates its
/// value in place without moving it, matching the ordering semantics the
/// wrapped tools were tested against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    entries: Vec<(String, FlagValue)>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&FlagValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or update a flag, keeping its original position on update.
    pub fn set(&mut self, key: &str, value: FlagValue) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.set(key, FlagValue::Bool(value))
    }

    pub fn set_scalar(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.set(key, FlagValue::Scalar(value.into()))
    }

    pub fn set_repeated<I, S>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(
            key,
            FlagValue::Repeated(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Insert a flag only when the key is absent.
    pub fn set_default(&mut self, key: &str, value: FlagValue) -> &mut Self {
        if !self.contains(key) {
            self.entries.push((key.to_string(), value));
        }
        self
    }

    /// Append a value to a repeated flag, creating it when absent.
    pub fn push_repeated(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, FlagValue::Repeated(values))) => values.push(value.into()),
            Some((_, v)) => {
                // An existing scalar is kept as the first element.
                let mut values = match std::mem::replace(v, FlagValue::Bool(false)) {
                    FlagValue::Scalar(existing) => vec![existing],
                    _ => Vec::new(),
                };
                values.push(value.into());
                *v = FlagValue::Repeated(values);
            }
            None => self
                .entries
                .push((key.to_string(), FlagValue::Repeated(vec![value.into()]))),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encode("", self).trim_start())
    }
}

/// Encode a base command token plus a FlagSet into one command-line string.
///
/// Encoding convention, reproduced exactly for compatibility with the
/// docker CLIs:
/// - `Bool(true)` appends a bare `--key` (underscores become dashes)
/// - `Bool(false)` appends nothing
/// - `Scalar` appends `--key value`
/// - `Repeated` appends one `--key value` pair per element, in order;
///   an empty collection appends nothing
/// - keys listed in [`RESERVED_KEYS`] are stripped
pub fn encode(base: &str, flags: &FlagSet) -> String {
    let mut cmd = base.to_string();

    for (key, value) in flags.iter() {
        if RESERVED_KEYS.contains(&key) {
            continue;
        }
        let name = key.replace('_', "-");
        match value {
            FlagValue::Bool(true) => {
                cmd.push_str(&format!(" --{name}"));
            }
            FlagValue::Bool(false) => {}
            FlagValue::Scalar(v) => {
                cmd.push_str(&format!(" --{name} {v}"));
            }
            FlagValue::Repeated(values) => {
                for v in values {
                    cmd.push_str(&format!(" --{name} {v}"));
                }
            }
        }
    }

    cmd
}
