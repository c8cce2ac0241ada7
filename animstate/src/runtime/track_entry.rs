use crate::{Animation, AnimationState, AnimationStateListener, Error};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EntryId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

#[derive(Debug)]
pub(crate) struct EntrySlot {
    pub(crate) generation: u32,
    pub(crate) entry: Option<TrackEntry>,
}

/// One scheduled playback of an animation on a track.
pub struct TrackEntry {
    pub track_index: usize,
    pub animation_index: usize,
    pub animation: Arc<Animation>,
    pub looped: bool,

    /// Elapsed time of this entry. Not wrapped for looping entries.
    pub track_time: f32,
    /// `track_time` as of the previous `apply`; `-1` before the first one.
    pub last_time: f32,
    pub time_scale: f32,

    /// For a queued entry: the predecessor's track time at which this entry
    /// takes over. For a current entry: wall time left before its clock runs.
    pub delay: f32,
    pub mix_time: f32,
    pub mix_duration: f32,
    pub event_threshold: Option<f32>,
    pub loops_completed: u32,

    pub(crate) mixing_from: Option<EntryId>,
    pub(crate) listener: Option<Box<dyn AnimationStateListener>>,
}

impl std::fmt::Debug for TrackEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackEntry")
            .field("track_index", &self.track_index)
            .field("animation_index", &self.animation_index)
            .field("animation", &self.animation.name)
            .field("looped", &self.looped)
            .field("track_time", &self.track_time)
            .field("last_time", &self.last_time)
            .field("time_scale", &self.time_scale)
            .field("delay", &self.delay)
            .field("mix_time", &self.mix_time)
            .field("mix_duration", &self.mix_duration)
            .field("mixing_from", &self.mixing_from)
            .field("event_threshold", &self.event_threshold)
            .field("loops_completed", &self.loops_completed)
            .finish()
    }
}

impl TrackEntry {
    pub(crate) fn new(
        track_index: usize,
        animation_index: usize,
        animation: Arc<Animation>,
        looped: bool,
    ) -> Self {
        Self {
            track_index,
            animation_index,
            animation,
            looped,
            track_time: 0.0,
            last_time: -1.0,
            time_scale: 1.0,
            delay: 0.0,
            mix_time: 0.0,
            mix_duration: 0.0,
            event_threshold: None,
            loops_completed: 0,
            mixing_from: None,
            listener: None,
        }
    }

    pub fn is_mixing(&self) -> bool {
        self.mixing_from.is_some()
    }

    /// Time within the animation: wrapped when looping, clamped to the
    /// duration otherwise.
    pub fn animation_time(&self) -> f32 {
        let duration = self.animation.duration;
        if self.looped {
            if duration <= 0.0 {
                return 0.0;
            }
            self.track_time.rem_euclid(duration)
        } else {
            self.track_time.min(duration)
        }
    }

    /// Track time at which the current loop iteration (or the whole animation
    /// when not looping) finishes.
    pub fn track_complete(&self) -> f32 {
        let duration = self.animation.duration;
        if duration != 0.0 {
            if self.looped {
                return duration * (1.0 + (self.track_time / duration).floor());
            }
            if self.track_time < duration {
                return duration;
            }
        }
        self.track_time
    }

    pub(crate) fn snapshot(&self) -> TrackEntrySnapshot {
        TrackEntrySnapshot {
            track_index: self.track_index,
            animation_index: self.animation_index,
            animation_name: self.animation.name.clone(),
            track_time: self.track_time,
            mix_time: self.mix_time,
            mix_duration: self.mix_duration,
        }
    }
}

/// Entry state captured when a notification was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackEntrySnapshot {
    pub track_index: usize,
    pub animation_index: usize,
    pub animation_name: String,
    pub track_time: f32,
    pub mix_time: f32,
    pub mix_duration: f32,
}

/// Weak reference to a [`TrackEntry`] owned by an [`AnimationState`].
///
/// Entries are freed once their `end` notification has been delivered; using a
/// handle after that yields [`Error::StaleEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackEntryHandle {
    pub(crate) id: EntryId,
}

impl TrackEntryHandle {
    fn with_entry_mut(
        &self,
        state: &mut AnimationState,
        f: impl FnOnce(&mut TrackEntry),
    ) -> Result<(), Error> {
        let entry = state.entry_mut(self.id).ok_or(Error::StaleEntry)?;
        f(entry);
        Ok(())
    }

    pub fn is_alive(&self, state: &AnimationState) -> bool {
        state.entry(self.id).is_some()
    }

    pub fn snapshot(&self, state: &AnimationState) -> Option<TrackEntrySnapshot> {
        state.entry(self.id).map(TrackEntry::snapshot)
    }

    pub fn track_time(&self, state: &AnimationState) -> Option<f32> {
        state.entry(self.id).map(|e| e.track_time)
    }

    pub fn delay(&self, state: &AnimationState) -> Option<f32> {
        state.entry(self.id).map(|e| e.delay)
    }

    pub fn mix_duration(&self, state: &AnimationState) -> Option<f32> {
        state.entry(self.id).map(|e| e.mix_duration)
    }

    pub fn set_listener<L: AnimationStateListener + 'static>(
        &self,
        state: &mut AnimationState,
        listener: L,
    ) -> Result<(), Error> {
        self.with_entry_mut(state, |entry| {
            entry.listener = Some(Box::new(listener));
        })
    }

    pub fn set_delay(&self, state: &mut AnimationState, delay: f32) -> Result<(), Error> {
        if !delay.is_finite() {
            return Err(Error::invalid_value("delay must be finite"));
        }
        self.with_entry_mut(state, |entry| {
            entry.delay = delay;
        })
    }

    pub fn set_time_scale(&self, state: &mut AnimationState, time_scale: f32) -> Result<(), Error> {
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(Error::invalid_value("time scale must be finite and >= 0"));
        }
        self.with_entry_mut(state, |entry| {
            entry.time_scale = time_scale;
        })
    }

    pub fn set_mix_duration(
        &self,
        state: &mut AnimationState,
        mix_duration: f32,
    ) -> Result<(), Error> {
        if !mix_duration.is_finite() || mix_duration < 0.0 {
            return Err(Error::invalid_value("mix duration must be finite and >= 0"));
        }
        self.with_entry_mut(state, |entry| {
            entry.mix_duration = mix_duration;
        })
    }

    pub fn set_event_threshold(
        &self,
        state: &mut AnimationState,
        threshold: f32,
    ) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::invalid_value("event threshold must be within [0, 1]"));
        }
        self.with_entry_mut(state, |entry| {
            entry.event_threshold = Some(threshold);
        })
    }
}
