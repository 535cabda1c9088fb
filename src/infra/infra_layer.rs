// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "blacklist/mod.rs"]
pub mod blacklist;
