//! Visual effect emission.
//!
//! The core decides *where* and *how many* particles appear; playing them is
//! the host's business. Emission is fire-and-forget.

use crate::math::Vec2;

/// Which particle system an emission is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Lightning,
    Feedback,
}

/// Host collaborator that plays positioned particle bursts.
pub trait EffectSink: std::fmt::Debug {
    fn emit(&mut self, kind: EffectKind, position: Vec2, count: u32);
}

/// One recorded emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub kind: EffectKind,
    pub position: Vec2,
    pub count: u32,
}

/// An [`EffectSink`] that records every emission, for tests and headless
/// hosts.
#[derive(Debug, Clone, Default)]
pub struct EffectLog {
    emissions: Vec<Emission>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emissions(&self) -> &[Emission] {
        &self.emissions
    }

    /// Total particle count emitted for `kind`.
    pub fn particles(&self, kind: EffectKind) -> u64 {
        self.emissions
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.count as u64)
            .sum()
    }

    pub fn count_of(&self, kind: EffectKind) -> usize {
        self.emissions.iter().filter(|e| e.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.emissions.clear();
    }
}

impl EffectSink for EffectLog {
    fn emit(&mut self, kind: EffectKind, position: Vec2, count: u32) {
        self.emissions.push(Emission {
            kind,
            position,
            count,
        });
    }
}

/// Shared handle so a test or host can keep reading the log after handing
/// the sink to a world.
impl EffectSink for std::rc::Rc<std::cell::RefCell<EffectLog>> {
    fn emit(&mut self, kind: EffectKind, position: Vec2, count: u32) {
        self.borrow_mut().emit(kind, position, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn log_records_in_order() {
        let mut log = EffectLog::new();
        log.emit(EffectKind::Lightning, Vec2::new(1.0, 0.0), 1);
        log.emit(EffectKind::Feedback, Vec2::new(2.0, 0.0), 2);
        log.emit(EffectKind::Feedback, Vec2::new(3.0, 0.0), 2);
        assert_eq!(log.emissions().len(), 3);
        assert_eq!(log.emissions()[0].kind, EffectKind::Lightning);
        assert_eq!(log.particles(EffectKind::Feedback), 4);
        assert_eq!(log.count_of(EffectKind::Lightning), 1);
    }

    #[test]
    fn shared_log_sees_emissions() {
        let shared = Rc::new(RefCell::new(EffectLog::new()));
        let mut sink: Box<dyn EffectSink> = Box::new(Rc::clone(&shared));
        sink.emit(EffectKind::Lightning, Vec2::ZERO, 25);
        assert_eq!(shared.borrow().particles(EffectKind::Lightning), 25);
    }
}
