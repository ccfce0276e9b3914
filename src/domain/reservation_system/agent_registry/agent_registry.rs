use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::reservation_system::utils::id::AgentId;

/// A known agent and the channel its replies go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRegistration {
    pub agent_id: AgentId,
    pub response_channel: PathBuf,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    /// The agent was known already; its response channel was refreshed.
    Refreshed,
    /// The registry is full, the agent is served but not recorded.
    CapacityExceeded,
}

#[derive(Debug, Default)]
struct RegistryInner {
    agents: HashMap<AgentId, AgentRegistration>,
    /// Registration order, for reporting.
    order: Vec<AgentId>,
}

/// Bounded set of registered agents, with its own lock independent of the
/// reservation/capacity domain.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    capacity: usize,
    inner: Arc<Mutex<RegistryInner>>,
}

impl AgentRegistry {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Arc::new(Mutex::new(RegistryInner::default())) }
    }

    pub fn register(&self, agent_id: AgentId, response_channel: &Path) -> RegistrationOutcome {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(known) = guard.agents.get_mut(&agent_id) {
            known.response_channel = response_channel.to_path_buf();
            known.active = true;
            return RegistrationOutcome::Refreshed;
        }

        if guard.agents.len() >= self.capacity {
            log::warn!("Agent registry is full ({} agents). Agent '{}' is served but not registered.", self.capacity, agent_id);
            return RegistrationOutcome::CapacityExceeded;
        }

        guard.order.push(agent_id.clone());
        guard.agents.insert(
            agent_id.clone(),
            AgentRegistration { agent_id, response_channel: response_channel.to_path_buf(), active: true },
        );
        RegistrationOutcome::Registered
    }

    /// Marks the agent as finished.
    ///
    /// # Returns
    /// `false` if the agent was never registered.
    pub fn deactivate(&self, agent_id: &AgentId) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.agents.get_mut(agent_id) {
            Some(registration) => {
                registration.active = false;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<AgentRegistration> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.agents.get(agent_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn active_count(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.agents.values().filter(|agent| agent.active).count()
    }

    /// Copies of all registrations in registration order.
    pub fn snapshot(&self) -> Vec<AgentRegistration> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.order.iter().filter_map(|id| guard.agents.get(id).cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_until_capacity_then_degrades() {
        let registry = AgentRegistry::new(2);

        assert_eq!(registry.register(AgentId::new("a"), Path::new("/tmp/a")), RegistrationOutcome::Registered);
        assert_eq!(registry.register(AgentId::new("b"), Path::new("/tmp/b")), RegistrationOutcome::Registered);
        assert_eq!(registry.register(AgentId::new("c"), Path::new("/tmp/c")), RegistrationOutcome::CapacityExceeded);

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&AgentId::new("c")).is_none());
    }

    #[test]
    fn re_registration_refreshes_channel() {
        let registry = AgentRegistry::new(1);
        registry.register(AgentId::new("a"), Path::new("/tmp/a-1"));
        registry.deactivate(&AgentId::new("a"));

        assert_eq!(registry.register(AgentId::new("a"), Path::new("/tmp/a-2")), RegistrationOutcome::Refreshed);

        let registration = registry.get(&AgentId::new("a")).unwrap();
        assert_eq!(registration.response_channel, PathBuf::from("/tmp/a-2"));
        assert!(registration.active);
    }

    #[test]
    fn deactivate_marks_agent_done() {
        let registry = AgentRegistry::new(4);
        registry.register(AgentId::new("a"), Path::new("/tmp/a"));
        registry.register(AgentId::new("b"), Path::new("/tmp/b"));

        assert!(registry.deactivate(&AgentId::new("a")));
        assert!(!registry.deactivate(&AgentId::new("unknown")));
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.snapshot().iter().map(|r| r.agent_id.to_string()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
