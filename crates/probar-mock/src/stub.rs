//! Stub Registry
//!
//! Per (mock, method) ordered groups of stubs. A real call resolves to the
//! action of the most recently defined group whose matchers accept its
//! arguments, so re-stubbing later in a test overrides earlier stubs.

use crate::ledger::TargetId;
use crate::matcher::{validate, ArgMatcherList};
use crate::result::MockResult;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Callback run by [`Action::Invoke`] with the call's arguments
pub type Callback = Rc<dyn Fn(&[Value]) -> MockResult<Value>>;

/// Configured behavior of a stub
#[derive(Clone, Default)]
pub enum Action {
    /// Not configured yet; the call gets the mock's default value
    #[default]
    Noop,
    /// Return a fixed value
    ReturnValue(Value),
    /// Return queued values one per call, repeating the last one
    ReturnSequence(VecDeque<Value>),
    /// Fail the call with a message
    Throw(String),
    /// Compute the result from the arguments
    Invoke(Callback),
    /// Run the mock's real implementation, if one was supplied
    CallThrough,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => f.write_str("Noop"),
            Self::ReturnValue(v) => f.debug_tuple("ReturnValue").field(v).finish(),
            Self::ReturnSequence(q) => f.debug_tuple("ReturnSequence").field(q).finish(),
            Self::Throw(m) => f.debug_tuple("Throw").field(m).finish(),
            Self::Invoke(_) => f.write_str("Invoke(..)"),
            Self::CallThrough => f.write_str("CallThrough"),
        }
    }
}

/// What one call does after its action fired
#[derive(Clone)]
pub enum Outcome {
    /// Use the mock's default value
    Default,
    /// Return this value
    Return(Value),
    /// Fail with this message
    Throw(String),
    /// Run this callback
    Invoke(Callback),
    /// Run the real implementation
    CallThrough,
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Return(v) => f.debug_tuple("Return").field(v).finish(),
            Self::Throw(m) => f.debug_tuple("Throw").field(m).finish(),
            Self::Invoke(_) => f.write_str("Invoke(..)"),
            Self::CallThrough => f.write_str("CallThrough"),
        }
    }
}

impl Action {
    /// Fire the action for one call, advancing sequence state
    pub fn fire(&mut self) -> Outcome {
        match self {
            Self::Noop => Outcome::Default,
            Self::ReturnValue(v) => Outcome::Return(v.clone()),
            Self::ReturnSequence(queue) => {
                let value = if queue.len() > 1 {
                    queue.pop_front().unwrap_or_default()
                } else {
                    queue.front().cloned().unwrap_or_default()
                };
                Outcome::Return(value)
            }
            Self::Throw(message) => Outcome::Throw(message.clone()),
            Self::Invoke(callback) => Outcome::Invoke(Rc::clone(callback)),
            Self::CallThrough => Outcome::CallThrough,
        }
    }
}

/// Stubs defined by one stubbing call
#[derive(Debug, Clone)]
pub struct StubGroup {
    /// Definition order; higher wins
    pub group_index: u64,
    /// Argument matchers
    pub matchers: ArgMatcherList,
    /// Behavior when applicable
    pub action: Action,
}

impl StubGroup {
    /// Check if this group applies to an argument list
    #[must_use]
    pub fn is_applicable(&self, args: &[Value]) -> bool {
        validate(&self.matchers, args)
    }
}

/// Reference to a registered group, used to configure its action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubHandle {
    /// Mock the stub belongs to
    pub target: TargetId,
    /// Stubbed method
    pub method: String,
    /// Index of the group
    pub group_index: u64,
}

/// Stub groups keyed by (mock, method)
#[derive(Debug, Default)]
pub struct StubRegistry {
    groups: HashMap<(TargetId, String), Vec<StubGroup>>,
    next_index: u64,
}

impl StubRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group with a no-op action and return its handle
    pub fn add_group(
        &mut self,
        target: TargetId,
        method: &str,
        matchers: ArgMatcherList,
    ) -> StubHandle {
        let group_index = self.next_index;
        self.next_index += 1;
        self.groups
            .entry((target, method.to_string()))
            .or_default()
            .push(StubGroup {
                group_index,
                matchers,
                action: Action::Noop,
            });
        StubHandle {
            target,
            method: method.to_string(),
            group_index,
        }
    }

    /// Set the action of a registered group; false if the group is gone
    pub fn set_action(&mut self, handle: &StubHandle, action: Action) -> bool {
        let group = self
            .groups
            .get_mut(&(handle.target, handle.method.clone()))
            .and_then(|groups| {
                groups
                    .iter_mut()
                    .find(|g| g.group_index == handle.group_index)
            });
        match group {
            Some(group) => {
                group.action = action;
                true
            }
            None => false,
        }
    }

    /// Action of the highest-index group applicable to `args`
    pub fn resolve(
        &mut self,
        target: TargetId,
        method: &str,
        args: &[Value],
    ) -> Option<&mut Action> {
        self.groups
            .get_mut(&(target, method.to_string()))?
            .iter_mut()
            .rev()
            .find(|g| g.is_applicable(args))
            .map(|g| &mut g.action)
    }

    /// Group indices and matchers of a method, highest index first
    ///
    /// Matchers are shared handles, so the snapshot can be evaluated after the
    /// registry is released.
    #[must_use]
    pub fn candidates(&self, target: TargetId, method: &str) -> Vec<(u64, ArgMatcherList)> {
        self.groups
            .get(&(target, method.to_string()))
            .map(|groups| {
                groups
                    .iter()
                    .rev()
                    .map(|g| (g.group_index, g.matchers.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fire the action of one group; `None` when the group is gone
    pub fn fire(&mut self, target: TargetId, method: &str, group_index: u64) -> Option<Outcome> {
        self.groups
            .get_mut(&(target, method.to_string()))?
            .iter_mut()
            .find(|g| g.group_index == group_index)
            .map(|g| g.action.fire())
    }

    /// Highest-index group applicable to `args`
    #[must_use]
    pub fn last_matching_group(
        &self,
        target: TargetId,
        method: &str,
        args: &[Value],
    ) -> Option<&StubGroup> {
        self.groups
            .get(&(target, method.to_string()))?
            .iter()
            .rev()
            .find(|g| g.is_applicable(args))
    }

    /// Index of the applicable group, or -1 when none applies
    #[must_use]
    pub fn get_last_matching_group_index(
        &self,
        target: TargetId,
        method: &str,
        args: &[Value],
    ) -> i64 {
        self.last_matching_group(target, method, args)
            .map_or(-1, |g| g.group_index as i64)
    }

    /// Number of groups registered for a method
    #[must_use]
    pub fn group_count(&self, target: TargetId, method: &str) -> usize {
        self.groups
            .get(&(target, method.to_string()))
            .map_or(0, Vec::len)
    }

    /// Remove every stub of one mock
    pub fn clear(&mut self, target: TargetId) {
        self.groups.retain(|(t, _), _| *t != target);
    }
}
