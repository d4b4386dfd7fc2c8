use slotmap::new_key_type;

new_key_type! {
    /// Identifies an agent in the world. Stable for the whole run and
    /// totally ordered, which the chain propagator uses to break ties.
    pub struct AgentId;
}
