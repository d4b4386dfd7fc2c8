use crate::agent::LightState;
use crate::config::ConfigError;
use crate::id::AgentId;

/// Errors raised by world operations.
///
/// None of these are transient: each one means the host or the core itself
/// broke a contract, so nothing here is worth retrying.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// `begin_lighting` was called on an agent that is not idle.
    #[error("agent {agent:?} cannot start lighting from state {state:?}")]
    InvalidState { agent: AgentId, state: LightState },

    /// The handle does not name an agent of this world.
    #[error("unknown agent: {0:?}")]
    UnknownAgent(AgentId),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
