use crate::MIN_TIME;

/*
Parameter Automation
====================

An automated parameter is a value plus a short, time-ordered list of
scheduled changes. The control thread schedules changes in device time
(seconds since the renderer started); the audio thread asks for the value
at each sample's time and the list is consumed as time passes.

Vocabulary
----------

  anchor      The (time, value) the parameter last settled at. Ramps start
              from the anchor, so a ramp always begins at the previous
              event, not at "now".

  set         Jump to a value at an exact time. Holds until the next event.

  exp ramp    Exponential glide from the anchor to a target value, arriving
              exactly at the event's time and holding afterwards.


The Shape: Exponential Release
------------------------------

  Level
    1.0 ─────────┐
                 │╲
                 │ ╲
                 │  ╲__
                 │     ╲___
  0.001          │         ───────
                 t0        t1
              (set 1.0)  (ramp to 0.001)

Perceived loudness is logarithmic, so an exponential fade sounds like an
even fade; a linear one sounds like it hangs and then drops off. The ramp
formula is:

    v(t) = v0 · (v1 / v0) ^ ((t - t0) / (t1 - t0))

It is undefined when v0 and v1 straddle zero or either is zero, so in that
case the value holds v0 and jumps to v1 at t1.


Realtime Safety
---------------

Events live in a Vec whose capacity is reserved up front and never grows.
Scheduling into a full list drops the event and reports it, rather than
allocating on the audio thread.
*/

/// Maximum number of pending events per parameter.
pub const MAX_EVENTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
enum EventKind {
    Set,
    ExponentialRamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ParamEvent {
    kind: EventKind,
    time: f64,
    value: f32,
}

pub struct AutomatedParam {
    value: f32,
    anchor_time: f64,
    anchor_value: f32,
    events: Vec<ParamEvent>,
}

impl AutomatedParam {
    pub fn new(initial: f32) -> Self {
        Self {
            value: initial,
            anchor_time: 0.0,
            anchor_value: initial,
            events: Vec::with_capacity(MAX_EVENTS),
        }
    }

    /// Schedule a jump to `value` at `time`. Returns false if the list is full.
    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> bool {
        self.insert(ParamEvent {
            kind: EventKind::Set,
            time,
            value,
        })
    }

    /// Schedule an exponential glide ending at `value` at `time`.
    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, time: f64) -> bool {
        self.insert(ParamEvent {
            kind: EventKind::ExponentialRamp,
            time,
            value,
        })
    }

    fn insert(&mut self, event: ParamEvent) -> bool {
        if self.events.len() == MAX_EVENTS {
            return false;
        }
        // Events at equal times keep scheduling order.
        let pos = self
            .events
            .iter()
            .position(|e| e.time > event.time)
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
        true
    }

    /// Value at device time `t`, consuming every event that has already landed.
    ///
    /// `t` must be non-decreasing between calls.
    pub fn value_at(&mut self, t: f64) -> f32 {
        while let Some(first) = self.events.first().copied() {
            if first.time > t {
                break;
            }
            self.value = first.value;
            self.anchor_time = first.time;
            self.anchor_value = first.value;
            self.events.remove(0);
        }

        if let Some(next) = self.events.first() {
            if next.kind == EventKind::ExponentialRamp {
                self.value = exponential(
                    self.anchor_time,
                    self.anchor_value,
                    next.time,
                    next.value,
                    t,
                );
            }
        }

        self.value
    }

    /// Last computed value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// True while events are still pending.
    pub fn is_automating(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn reset(&mut self, value: f32) {
        self.value = value;
        self.anchor_time = 0.0;
        self.anchor_value = value;
        self.events.clear();
    }
}

#[inline]
fn exponential(t0: f64, v0: f32, t1: f64, v1: f32, t: f64) -> f32 {
    let span = t1 - t0;
    if span <= MIN_TIME || v0 == 0.0 || v1 == 0.0 || (v0 > 0.0) != (v1 > 0.0) {
        return v0;
    }
    let progress = ((t - t0) / span).clamp(0.0, 1.0);
    v0 * (v1 / v0).powf(progress as f32)
}
