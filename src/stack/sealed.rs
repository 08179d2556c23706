// ABOUTME: Sealed trait pattern for the Stack trait.
// ABOUTME: Exactly two backends exist; external implementations are not supported.

/// Sealed trait to prevent external implementations.
///
/// The stack contract is a closed set: the compose and swarm backends are
/// the only implementers, and keeping the trait sealed lets it grow
/// without breaking semver.
pub trait Sealed {}
