//! Automatable parameter timeline
//!
//! A `Param` holds a list of scheduled automation events against the audio
//! clock. Ramps start from the previous event (or from the intrinsic value at
//! time zero when there is none), the same way web-audio parameters behave.

/// Smallest value an exponential ramp may start from or target
pub const FLOOR: f32 = 0.0001;

/// Shape of the segment that ends at an automation event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// Jump to the value at the event time
    Set,
    /// Linear interpolation from the previous event
    Linear,
    /// Exponential interpolation from the previous event
    Exponential,
}

/// One automation event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationEvent {
    pub time: f64,
    pub value: f32,
    pub curve: Curve,
}

/// Parameter with scheduled automation
#[derive(Debug, Clone)]
pub struct Param {
    /// Value used before any event takes effect
    intrinsic: f32,
    /// Events, sorted by time (stable for equal times)
    events: Vec<AutomationEvent>,
}

impl Param {
    pub fn new(value: f32) -> Self {
        Self {
            intrinsic: value,
            events: Vec::with_capacity(8),
        }
    }

    /// Number of pending automation events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    fn insert(&mut self, event: AutomationEvent) {
        let idx = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(idx, event);
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            curve: Curve::Set,
        });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            curve: Curve::Linear,
        });
    }

    /// Schedule an exponential ramp. Targets below `FLOOR` are raised to it.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value: value.max(FLOOR),
            curve: Curve::Exponential,
        });
    }

    /// Remove every event scheduled at or after `time`
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time < time);
    }

    /// Freeze the parameter at its current value and drop later automation
    pub fn cancel_and_hold_at_time(&mut self, time: f64) {
        let held = self.value_at(time);
        self.cancel_scheduled_values(time);
        self.set_value_at_time(held, time);
    }

    /// Evaluate the timeline at `time`
    pub fn value_at(&self, time: f64) -> f32 {
        let next_idx = self.events.partition_point(|e| e.time <= time);

        let (prev_time, prev_value) = match next_idx.checked_sub(1) {
            Some(i) => (self.events[i].time, self.events[i].value),
            None => (0.0, self.intrinsic),
        };

        let Some(next) = self.events.get(next_idx) else {
            return prev_value;
        };

        let span = next.time - prev_time;
        if span <= 0.0 {
            return prev_value;
        }
        let progress = ((time - prev_time) / span).clamp(0.0, 1.0) as f32;

        match next.curve {
            Curve::Set => prev_value,
            Curve::Linear => prev_value + (next.value - prev_value) * progress,
            Curve::Exponential => {
                let from = prev_value.max(FLOOR);
                from * (next.value / from).powf(progress)
            }
        }
    }

    /// Drop events that can no longer influence values at or after `time`
    ///
    /// The latest event at or before `time` is kept since it anchors the
    /// segment currently in progress.
    pub fn prune_before(&mut self, time: f64) {
        let settled = self.events.partition_point(|e| e.time <= time);
        if settled > 1 {
            let anchor = self.events[settled - 1];
            self.intrinsic = anchor.value;
            self.events.drain(..settled - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_value_without_events() {
        let p = Param::new(0.5);
        assert_eq!(p.value_at(0.0), 0.5);
        assert_eq!(p.value_at(10.0), 0.5);
    }

    #[test]
    fn test_linear_ramp_midpoint() {
        let mut p = Param::new(0.0);
        p.set_value_at_time(0.0, 1.0);
        p.linear_ramp_to_value_at_time(1.0, 2.0);
        assert!((p.value_at(1.5) - 0.5).abs() < 1e-5);
        assert_eq!(p.value_at(3.0), 1.0);
    }

    #[test]
    fn test_exponential_ramp_never_reaches_zero() {
        let mut p = Param::new(1.0);
        p.set_value_at_time(1.0, 0.0);
        p.exponential_ramp_to_value_at_time(0.0, 1.0);
        let end = p.value_at(1.0);
        assert_eq!(end, FLOOR);
        // Geometric midpoint of 1.0 and FLOOR
        let mid = p.value_at(0.5);
        assert!((mid - FLOOR.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_cancel_and_hold() {
        let mut p = Param::new(1.0);
        p.set_value_at_time(0.0, 0.0);
        p.linear_ramp_to_value_at_time(1.0, 1.0);
        p.cancel_and_hold_at_time(0.25);
        assert!((p.value_at(0.25) - 0.25).abs() < 1e-5);
        assert!((p.value_at(5.0) - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_prune_keeps_current_segment() {
        let mut p = Param::new(0.0);
        p.set_value_at_time(0.2, 0.0);
        p.set_value_at_time(0.4, 1.0);
        p.linear_ramp_to_value_at_time(1.0, 3.0);
        let before = p.value_at(2.0);
        p.prune_before(2.0);
        assert_eq!(p.event_count(), 2);
        assert!((p.value_at(2.0) - before).abs() < 1e-6);
    }
}
