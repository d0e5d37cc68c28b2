//! Debounce/cooldown gate.
//!
//! Converts the raw per-frame gesture stream into sparse fire events. A
//! candidate gesture is accepted only when strictly more than its cooldown
//! has elapsed since the previous accepted fire.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gmc_models::{BindingTable, CooldownPolicy, Gesture};
use tracing::trace;

/// Timestamps of previously accepted fires.
///
/// Under [`CooldownPolicy::Shared`] only `last_fire` is used; under
/// [`CooldownPolicy::PerGesture`] only `per_gesture` is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateState {
    last_fire: Option<Instant>,
    per_gesture: HashMap<Gesture, Instant>,
}

impl GateState {
    /// Last accepted fire of any gesture.
    pub fn last_fire(&self) -> Option<Instant> {
        self.last_fire
            .into_iter()
            .chain(self.per_gesture.values().copied())
            .max()
    }

    /// Last accepted fire of one gesture under the per-gesture policy.
    pub fn last_fire_of(&self, gesture: Gesture) -> Option<Instant> {
        self.per_gesture.get(&gesture).copied()
    }

    /// True before the first accepted fire.
    pub fn is_pristine(&self) -> bool {
        self.last_fire.is_none() && self.per_gesture.is_empty()
    }
}

/// Outcome of a gate evaluation, for logging and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Nothing to evaluate (`Gesture::None`).
    Idle,
    Fired(Gesture),
    Suppressed(Gesture),
}

impl GateDecision {
    pub fn fired(&self) -> Option<Gesture> {
        match self {
            GateDecision::Fired(g) => Some(*g),
            _ => None,
        }
    }
}

/// Cooldown state machine over a fixed binding table.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    bindings: BindingTable,
    policy: CooldownPolicy,
    state: GateState,
}

impl CooldownGate {
    pub fn new(bindings: BindingTable, policy: CooldownPolicy) -> Self {
        Self {
            bindings,
            policy,
            state: GateState::default(),
        }
    }

    /// Gate with the default bindings and the shared clock.
    pub fn shared(bindings: BindingTable) -> Self {
        Self::new(bindings, CooldownPolicy::Shared)
    }

    pub fn policy(&self) -> CooldownPolicy {
        self.policy
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Returns the gesture when it fires this frame.
    pub fn evaluate(&mut self, gesture: Gesture, now: Instant) -> Option<Gesture> {
        self.decide(gesture, now).fired()
    }

    /// Like [`evaluate`](Self::evaluate) but reports suppressions as well.
    pub fn decide(&mut self, gesture: Gesture, now: Instant) -> GateDecision {
        let Some(binding) = self.bindings.get(gesture) else {
            return GateDecision::Idle;
        };
        let cooldown = binding.cooldown();

        let previous = match self.policy {
            CooldownPolicy::Shared => self.state.last_fire,
            CooldownPolicy::PerGesture => self.state.per_gesture.get(&gesture).copied(),
        };

        if !cooldown_elapsed(previous, now, cooldown) {
            trace!(gesture = %gesture, "Gesture suppressed by cooldown");
            return GateDecision::Suppressed(gesture);
        }

        match self.policy {
            CooldownPolicy::Shared => self.state.last_fire = Some(now),
            CooldownPolicy::PerGesture => {
                self.state.per_gesture.insert(gesture, now);
            }
        }
        GateDecision::Fired(gesture)
    }
}

/// Strictly-greater elapsed check. A clock that ran backwards counts as not elapsed.
fn cooldown_elapsed(previous: Option<Instant>, now: Instant, cooldown: Duration) -> bool {
    match previous {
        None => true,
        Some(prev) => match now.checked_duration_since(prev) {
            Some(elapsed) => elapsed > cooldown,
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_fire_accepted() {
        let mut gate = CooldownGate::shared(BindingTable::default());
        let t0 = Instant::now();
        assert_eq!(gate.evaluate(Gesture::PlayPause, t0), Some(Gesture::PlayPause));
        assert_eq!(gate.state().last_fire(), Some(t0));
    }

    #[test]
    fn test_cooldown_boundary_is_strict() {
        let table = BindingTable::default();
        for (gesture, binding) in table.iter() {
            let mut gate = CooldownGate::shared(table.clone());
            let t0 = Instant::now();
            let cooldown = binding.cooldown();

            assert!(gate.evaluate(gesture, t0).is_some());
            assert!(gate.evaluate(gesture, t0 + cooldown / 2).is_none());
            assert!(gate.evaluate(gesture, t0 + cooldown).is_none(), "{gesture} at exactly cooldown");
            assert_eq!(
                gate.evaluate(gesture, t0 + cooldown + Duration::from_nanos(1)),
                Some(gesture)
            );
        }
    }

    #[test]
    fn test_none_never_mutates_state() {
        let mut gate = CooldownGate::shared(BindingTable::default());
        let t0 = Instant::now();
        for i in 0..1000 {
            assert_eq!(gate.decide(Gesture::None, t0 + ms(i)), GateDecision::Idle);
        }
        assert!(gate.state().is_pristine());

        gate.evaluate(Gesture::Mute, t0);
        let before = gate.state().clone();
        for i in 0..1000 {
            gate.evaluate(Gesture::None, t0 + ms(5000 + i));
        }
        assert_eq!(gate.state(), &before);
    }

    #[test]
    fn test_shared_clock_suppresses_other_gestures() {
        let mut gate = CooldownGate::shared(BindingTable::default());
        let t0 = Instant::now();
        assert!(gate.evaluate(Gesture::PlayPause, t0).is_some());
        // Mute has its own 1s cooldown, measured from the play/pause fire.
        assert!(gate.evaluate(Gesture::Mute, t0 + ms(500)).is_none());
        // Volume only needs 200ms since the last fire of anything.
        assert!(gate.evaluate(Gesture::VolumeUp, t0 + ms(201)).is_some());
        assert!(gate.evaluate(Gesture::Mute, t0 + ms(1100)).is_none());
        assert!(gate.evaluate(Gesture::Mute, t0 + ms(1202)).is_some());
    }

    #[test]
    fn test_per_gesture_clocks_are_independent() {
        let mut gate = CooldownGate::new(BindingTable::default(), CooldownPolicy::PerGesture);
        let t0 = Instant::now();
        assert!(gate.evaluate(Gesture::PlayPause, t0).is_some());
        assert!(gate.evaluate(Gesture::Mute, t0 + ms(10)).is_some());
        assert!(gate.evaluate(Gesture::PlayPause, t0 + ms(500)).is_none());
        assert_eq!(gate.state().last_fire_of(Gesture::Mute), Some(t0 + ms(10)));
        assert_eq!(gate.state().last_fire(), Some(t0 + ms(10)));
    }

    #[test]
    fn test_backwards_clock_is_suppressed() {
        let mut gate = CooldownGate::shared(BindingTable::default());
        let t0 = Instant::now() + Duration::from_secs(10);
        assert!(gate.evaluate(Gesture::VolumeUp, t0).is_some());
        assert_eq!(
            gate.decide(Gesture::VolumeUp, t0 - Duration::from_secs(5)),
            GateDecision::Suppressed(Gesture::VolumeUp)
        );
        assert_eq!(gate.state().last_fire(), Some(t0));
    }

    #[test]
    fn test_held_gesture_fires_once_per_window() {
        let mut gate = CooldownGate::shared(BindingTable::default());
        let t0 = Instant::now();
        // 2 seconds of volume-up at 10ms spacing with a 200ms cooldown.
        let fires = (0..200)
            .filter(|i| gate.evaluate(Gesture::VolumeUp, t0 + ms(i * 10)).is_some())
            .count();
        // Fires at 0, 210, 420, ... 1890.
        assert_eq!(fires, 10);
    }
}
