//! Instance lifecycle helpers for the Scaleway backend.

mod fetch;
mod power;

use crate::backend::{InstanceState, InstanceStatus};
use crate::scaleway::types::{Action, InstanceId};

/// Subset of a Scaleway server record needed for power decisions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceSnapshot {
    pub(crate) id: InstanceId,
    pub(crate) state: String,
    pub(crate) allowed_actions: Vec<Action>,
    pub(crate) public_ip: Option<String>,
}

impl InstanceSnapshot {
    pub(crate) fn status(&self) -> InstanceStatus {
        InstanceStatus {
            state: InstanceState::new(self.state.as_str()),
            public_address: self.public_ip.clone(),
        }
    }

    fn allows(&self, action: &str) -> bool {
        self.allowed_actions
            .iter()
            .any(|allowed| allowed.as_str() == action)
    }
}

#[cfg(test)]
mod tests;
