use super::event_timeline::scan_track_time;
use super::track_entry::{EntryId, EntrySlot};
use crate::{
    AnimationStateData, AnimationStateEvent, AnimationStateListener, Error, PoseTarget,
    TrackEntry, TrackEntryHandle, TrackEntrySnapshot,
};
use std::collections::VecDeque;

#[derive(Clone, Debug)]
struct QueuedEvent {
    entry: EntryId,
    snapshot: TrackEntrySnapshot,
    event: AnimationStateEvent,
}

#[derive(Default)]
struct Track {
    current: Option<EntryId>,
    queue: VecDeque<EntryId>,
}

/// Plays animations on independent tracks, crossfading between queued entries
/// and reporting lifecycle notifications to listeners.
///
/// Each frame, call [`update`](Self::update) to advance time and then
/// [`apply`](Self::apply) to pose the tracks. `update` decides transitions
/// (queued entries taking over, finished entries ending); `apply` scans
/// completions and user events and delivers every pending notification.
pub struct AnimationState {
    data: AnimationStateData,
    tracks: Vec<Track>,
    entries: Vec<EntrySlot>,
    free_list: Vec<usize>,
    event_queue: VecDeque<QueuedEvent>,
    listeners: Vec<Box<dyn AnimationStateListener>>,
    listeners_cleared: bool,
    draining_events: bool,
    time: f32,
    time_scale: f32,
    event_threshold: f32,
}

impl AnimationState {
    pub fn new(data: AnimationStateData) -> Self {
        Self {
            data,
            tracks: Vec::new(),
            entries: Vec::new(),
            free_list: Vec::new(),
            event_queue: VecDeque::new(),
            listeners: Vec::new(),
            listeners_cleared: false,
            draining_events: false,
            time: 0.0,
            time_scale: 1.0,
            event_threshold: 0.0,
        }
    }

    /// Registers a listener. Listeners are notified in registration order,
    /// after the entry's own listener.
    pub fn add_listener<L: AnimationStateListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener));
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
        if self.draining_events {
            self.listeners_cleared = true;
        }
    }

    /// Total scaled time this state has been updated by.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn data(&self) -> &AnimationStateData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut AnimationStateData {
        &mut self.data
    }

    pub fn tracks_len(&self) -> usize {
        self.tracks.len()
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f32) -> Result<(), Error> {
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(Error::invalid_value("time scale must be finite and >= 0"));
        }
        self.time_scale = time_scale;
        Ok(())
    }

    pub fn event_threshold(&self) -> f32 {
        self.event_threshold
    }

    /// Outgoing entries of a crossfade keep firing user events while the mix
    /// percentage is below this threshold. 0 silences them for the whole mix,
    /// 1 lets them fire until the mix completes. Entries may override it.
    pub fn set_event_threshold(&mut self, threshold: f32) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::invalid_value("event threshold must be within [0, 1]"));
        }
        self.event_threshold = threshold;
        Ok(())
    }

    pub fn set_default_mix(&mut self, duration: f32) -> Result<(), Error> {
        self.data.set_default_mix(duration)
    }

    pub fn set_mix(&mut self, from: &str, to: &str, duration: f32) -> Result<(), Error> {
        self.data.set_mix(from, to, duration)
    }

    pub fn get_current(&self, track_index: usize) -> Option<TrackEntryHandle> {
        let id = self.tracks.get(track_index)?.current?;
        self.entry(id)?;
        Some(TrackEntryHandle { id })
    }

    pub fn with_track_entry<F: FnOnce(&TrackEntry) -> R, R>(
        &self,
        track_index: usize,
        f: F,
    ) -> Option<R> {
        let id = self.tracks.get(track_index)?.current?;
        let entry = self.entry(id)?;
        Some(f(entry))
    }

    /// Number of entries waiting behind the current entry of a track.
    pub fn queued_len(&self, track_index: usize) -> usize {
        self.tracks.get(track_index).map_or(0, |t| t.queue.len())
    }

    /// Replaces the track's current entry immediately and discards its queue.
    ///
    /// The replaced entry is interrupted; it keeps playing as the outgoing side
    /// of a crossfade when a mix duration is configured for the pair, otherwise
    /// it ends right away.
    pub fn set_animation(
        &mut self,
        track_index: usize,
        animation_name: &str,
        looped: bool,
    ) -> Result<TrackEntryHandle, Error> {
        let (animation_index, animation) = self.data.find_animation(animation_name)?;
        self.ensure_track(track_index);

        let (old_current, queued_entries) = {
            let track = &mut self.tracks[track_index];
            let old_current = track.current.take();
            let queued_entries = track.queue.drain(..).collect::<Vec<_>>();
            (old_current, queued_entries)
        };
        // Queued entries never started, so they leave without notifications.
        for queued in queued_entries {
            self.free_entry(queued);
        }

        let entry_id = self.alloc_entry(TrackEntry::new(
            track_index,
            animation_index,
            animation,
            looped,
        ));

        if let Some(old) = old_current {
            let from_index = self.entry(old).map(|e| e.animation_index);
            let mix_duration = from_index
                .map(|from| self.data.mix_duration(from, animation_index))
                .unwrap_or(0.0);
            self.queue_event(old, AnimationStateEvent::Interrupt);
            if mix_duration > 0.0 {
                if let Some(entry) = self.entry_mut(entry_id) {
                    entry.mix_duration = mix_duration;
                    entry.mixing_from = Some(old);
                }
            } else {
                self.end_mixing_chain(old);
            }
        }

        log::debug!("track {track_index}: set '{animation_name}' (looped: {looped})");
        self.tracks[track_index].current = Some(entry_id);
        self.queue_event(entry_id, AnimationStateEvent::Start);
        self.drain_event_queue();

        Ok(TrackEntryHandle { id: entry_id })
    }

    /// Queues an animation to play after the last entry of the track.
    ///
    /// A `delay <= 0` schedules the entry to start mixing in so the crossfade
    /// ends when the previous entry completes (its current loop, when looping);
    /// `delay` is then added to that point. On an empty track the entry becomes
    /// current at once and `delay` is wall time to wait before its clock runs.
    pub fn add_animation(
        &mut self,
        track_index: usize,
        animation_name: &str,
        looped: bool,
        delay: f32,
    ) -> Result<TrackEntryHandle, Error> {
        let (animation_index, animation) = self.data.find_animation(animation_name)?;
        if !delay.is_finite() {
            return Err(Error::invalid_value("delay must be finite"));
        }
        self.ensure_track(track_index);

        let last = {
            let track = &self.tracks[track_index];
            track.queue.back().copied().or(track.current)
        };
        let predecessor = last.and_then(|id| {
            self.entry(id).map(|last_ref| {
                (
                    last_ref.track_complete(),
                    self.data
                        .mix_duration(last_ref.animation_index, animation_index),
                )
            })
        });

        let mut entry = TrackEntry::new(track_index, animation_index, animation, looped);
        match predecessor {
            Some((last_track_complete, mix_duration)) => {
                entry.mix_duration = mix_duration;
                entry.delay = if delay > 0.0 {
                    delay
                } else {
                    (delay + last_track_complete - mix_duration).max(0.0)
                };
                log::debug!(
                    "track {track_index}: queued '{animation_name}' at delay {} (mix {mix_duration})",
                    entry.delay
                );
                let entry_id = self.alloc_entry(entry);
                self.tracks[track_index].queue.push_back(entry_id);
                Ok(TrackEntryHandle { id: entry_id })
            }
            None => {
                entry.delay = delay.max(0.0);
                log::debug!(
                    "track {track_index}: '{animation_name}' starts on an empty track (delay {})",
                    entry.delay
                );
                let entry_id = self.alloc_entry(entry);
                self.tracks[track_index].current = Some(entry_id);
                self.queue_event(entry_id, AnimationStateEvent::Start);
                self.drain_event_queue();
                Ok(TrackEntryHandle { id: entry_id })
            }
        }
    }

    /// Advances every track by `delta` seconds (scaled by the state and entry
    /// time scales) and performs the transitions that became due.
    ///
    /// Transitions are decided against the track time the previous `apply`
    /// scanned up to, so an entry never ends or hands over before its events
    /// and completion have been reported, whatever the step size or the number
    /// of updates between two applies.
    /// Listeners are not called here: the notifications are delivered by the
    /// next [`apply`](Self::apply).
    pub fn update(&mut self, delta: f32) {
        if !delta.is_finite() || delta <= 0.0 {
            log::debug!("ignoring non-advancing update (delta {delta})");
            return;
        }
        let delta = delta * self.time_scale;
        self.time += delta;

        for track_index in 0..self.tracks.len() {
            let Some(current_id) = self.tracks[track_index].current else {
                continue;
            };
            let Some(current) = self.entry_mut(current_id) else {
                self.tracks[track_index].current = None;
                continue;
            };

            let mut current_delta = delta * current.time_scale;
            if current.delay > 0.0 {
                current.delay -= current_delta;
                if current.delay > 0.0 {
                    continue;
                }
                current_delta = -current.delay;
                current.delay = 0.0;
            }

            // Only time already scanned by `apply` may trigger a transition.
            let track_last = current.last_time;
            let scanned = track_last >= 0.0;
            let finished = !current.looped
                && current.mixing_from.is_none()
                && scanned
                && track_last >= current.animation.duration;

            if let Some(next_id) = self.tracks[track_index].queue.front().copied() {
                let next_delay = self.entry(next_id).map_or(0.0, |next| next.delay);
                if scanned && track_last >= next_delay {
                    self.promote_next(
                        track_index,
                        current_id,
                        track_last - next_delay,
                        delta,
                        current_delta,
                    );
                    continue;
                }
            } else if finished {
                log::debug!("track {track_index}: entry finished at {track_last}");
                self.tracks[track_index].current = None;
                self.queue_event(current_id, AnimationStateEvent::End);
                continue;
            }

            self.advance_mixing_chain(current_id, delta);
            if let Some(current) = self.entry_mut(current_id) {
                current.track_time += current_delta;
            }
        }
    }

    /// Replaces the current entry of a track with the head of its queue.
    /// `leftover` is the part of the current entry's scanned time past the
    /// queued entry's delay; it is carried into the new entry.
    fn promote_next(
        &mut self,
        track_index: usize,
        current_id: EntryId,
        leftover: f32,
        delta: f32,
        current_delta: f32,
    ) {
        let Some(next_id) = self.tracks[track_index].queue.pop_front() else {
            return;
        };

        let current_time_scale = match self.entry_mut(current_id) {
            Some(current) => {
                current.track_time += current_delta;
                current.time_scale
            }
            None => 0.0,
        };
        self.advance_mixing_chain(current_id, delta);

        let carried = if current_time_scale > 0.0 {
            leftover / current_time_scale
        } else {
            0.0
        };
        let mix_duration = match self.entry_mut(next_id) {
            Some(next) => {
                next.delay = 0.0;
                next.track_time = (carried + delta) * next.time_scale;
                next.mix_time = delta;
                next.mix_duration
            }
            None => 0.0,
        };

        log::debug!("track {track_index}: promoted queued entry (mix {mix_duration})");
        self.tracks[track_index].current = Some(next_id);
        self.queue_event(next_id, AnimationStateEvent::Start);
        self.queue_event(current_id, AnimationStateEvent::Interrupt);
        if mix_duration > 0.0 {
            if let Some(next) = self.entry_mut(next_id) {
                next.mixing_from = Some(current_id);
            }
        } else {
            self.end_mixing_chain(current_id);
        }
    }

    /// Advances the entries an entry is mixing from, and the mix times along the chain.
    fn advance_mixing_chain(&mut self, to: EntryId, delta: f32) {
        let mut to = to;
        while let Some(from) = self.entry(to).and_then(|entry| entry.mixing_from) {
            if let Some(from_entry) = self.entry_mut(from) {
                from_entry.track_time += delta * from_entry.time_scale;
            }
            if let Some(to_entry) = self.entry_mut(to) {
                to_entry.mix_time += delta;
            }
            to = from;
        }
    }

    /// Poses every track into `target`, detects completions and user events
    /// for the time elapsed since the previous call, and delivers all pending
    /// notifications. Calling it again without an `update` in between fires
    /// nothing new.
    pub fn apply<P: PoseTarget + ?Sized>(&mut self, target: &mut P) {
        for track_index in 0..self.tracks.len() {
            let Some(current_id) = self.tracks[track_index].current else {
                continue;
            };
            if self.entry(current_id).is_none_or(|entry| entry.delay > 0.0) {
                continue;
            }

            let mix = self.apply_mixing_from(current_id, target);
            if let Some(current) = self.entry(current_id) {
                if mix > 0.0 {
                    target.apply_animation(
                        track_index,
                        &current.animation,
                        current.animation_time(),
                        current.looped,
                        mix,
                    );
                }
            }
            self.scan_entry(current_id, true);
        }

        self.drain_event_queue();
    }

    /// Resolves the outgoing side of `to`'s crossfade, oldest entry first, and
    /// returns the weight of `to`.
    fn apply_mixing_from<P: PoseTarget + ?Sized>(&mut self, to: EntryId, target: &mut P) -> f32 {
        let Some((from, mix_time, mix_duration)) = self.entry(to).and_then(|to_ref| {
            to_ref
                .mixing_from
                .map(|from| (from, to_ref.mix_time, to_ref.mix_duration))
        }) else {
            return 1.0;
        };

        if self.entry(from).is_some_and(|entry| entry.mixing_from.is_some()) {
            self.apply_mixing_from(from, target);
        }

        let mix = if mix_duration <= 0.0 {
            1.0
        } else {
            (mix_time / mix_duration).min(1.0)
        };

        let Some(from_ref) = self.entry(from) else {
            if let Some(to_entry) = self.entry_mut(to) {
                to_entry.mixing_from = None;
            }
            return 1.0;
        };
        let threshold = from_ref.event_threshold.unwrap_or(self.event_threshold);
        if mix < 1.0 {
            target.apply_animation(
                from_ref.track_index,
                &from_ref.animation,
                from_ref.animation_time(),
                from_ref.looped,
                1.0 - mix,
            );
        }

        self.scan_entry(from, mix < threshold);

        if mix_time >= mix_duration {
            let older = self
                .entry_mut(from)
                .and_then(|from_entry| from_entry.mixing_from.take());
            if let Some(to_entry) = self.entry_mut(to) {
                to_entry.mixing_from = older;
            }
            log::debug!("mix out finished after {mix_time}");
            self.queue_event(from, AnimationStateEvent::End);
        }

        mix
    }

    /// Queues the user events and loop completions of `entry_id` since its
    /// previous scan, then marks the entry as scanned up to its track time.
    fn scan_entry(&mut self, entry_id: EntryId, events_enabled: bool) {
        let Some(entry) = self.entry(entry_id) else {
            return;
        };
        let timeline = entry
            .animation
            .event_timeline
            .as_ref()
            .filter(|_| events_enabled);
        let mut fired = Vec::new();
        let loops_completed = scan_track_time(
            timeline,
            entry.animation.duration,
            entry.looped,
            entry.last_time,
            entry.track_time,
            entry.loops_completed,
            &mut fired,
        );
        if !fired.is_empty() {
            log::trace!(
                "'{}' fired {} notification(s) over ({}, {}]",
                entry.animation.name,
                fired.len(),
                entry.last_time,
                entry.track_time
            );
        }

        if let Some(entry) = self.entry_mut(entry_id) {
            entry.last_time = entry.track_time;
            entry.loops_completed = loops_completed;
        }
        for event in fired {
            self.queue_event(entry_id, event);
        }
    }

    /// Ends the current entry of a track, and any entries it was mixing from.
    /// Queued entries are discarded.
    pub fn clear_track(&mut self, track_index: usize) {
        self.clear_track_internal(track_index);
        self.drain_event_queue();
    }

    pub fn clear_tracks(&mut self) {
        for track_index in 0..self.tracks.len() {
            self.clear_track_internal(track_index);
        }
        self.tracks.clear();
        self.drain_event_queue();
    }

    fn clear_track_internal(&mut self, track_index: usize) {
        let Some(track) = self.tracks.get_mut(track_index) else {
            return;
        };
        let current = track.current.take();
        let queued = track.queue.drain(..).collect::<Vec<_>>();
        for entry in queued {
            self.free_entry(entry);
        }
        if let Some(entry_id) = current {
            log::debug!("track {track_index}: cleared");
            self.end_mixing_chain(entry_id);
        }
    }

    /// Queues `End` for an entry and every entry it is still mixing from.
    fn end_mixing_chain(&mut self, entry_id: EntryId) {
        let mut next = Some(entry_id);
        while let Some(id) = next {
            next = self.entry_mut(id).and_then(|entry| entry.mixing_from.take());
            self.queue_event(id, AnimationStateEvent::End);
        }
    }

    fn ensure_track(&mut self, track_index: usize) {
        if track_index >= self.tracks.len() {
            self.tracks.resize_with(track_index + 1, Track::default);
        }
    }

    fn alloc_entry(&mut self, entry: TrackEntry) -> EntryId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.entries[index];
            slot.entry = Some(entry);
            EntryId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.entries.len();
            self.entries.push(EntrySlot {
                generation: 0,
                entry: Some(entry),
            });
            EntryId {
                index,
                generation: 0,
            }
        }
    }

    pub(crate) fn entry(&self, id: EntryId) -> Option<&TrackEntry> {
        let slot = self.entries.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub(crate) fn entry_mut(&mut self, id: EntryId) -> Option<&mut TrackEntry> {
        let slot = self.entries.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    fn free_entry(&mut self, id: EntryId) {
        let Some(slot) = self.entries.get_mut(id.index) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
    }

    /// Records a notification with the entry's state as of now.
    fn queue_event(&mut self, entry_id: EntryId, event: AnimationStateEvent) {
        let Some(snapshot) = self.entry(entry_id).map(TrackEntry::snapshot) else {
            return;
        };
        self.event_queue.push_back(QueuedEvent {
            entry: entry_id,
            snapshot,
            event,
        });
    }

    fn take_entry_listener(&mut self, id: EntryId) -> Option<Box<dyn AnimationStateListener>> {
        self.entry_mut(id).and_then(|entry| entry.listener.take())
    }

    fn restore_entry_listener(&mut self, id: EntryId, listener: Box<dyn AnimationStateListener>) {
        if let Some(entry) = self.entry_mut(id) {
            if entry.listener.is_none() {
                entry.listener = Some(listener);
            }
        }
    }

    fn drain_event_queue(&mut self) {
        if self.draining_events {
            return;
        }
        self.draining_events = true;

        while let Some(queued) = self.event_queue.pop_front() {
            let entry_id = queued.entry;

            let mut entry_listener = self.take_entry_listener(entry_id);
            if let Some(listener) = entry_listener.as_mut() {
                queued
                    .event
                    .notify(listener.as_mut(), self, &queued.snapshot);
            }

            let mut listeners = std::mem::take(&mut self.listeners);
            for listener in listeners.iter_mut() {
                queued
                    .event
                    .notify(listener.as_mut(), self, &queued.snapshot);
                if self.listeners_cleared {
                    break;
                }
            }
            if self.listeners_cleared {
                self.listeners_cleared = false;
            } else {
                // Keep registration order: listeners added during dispatch go last.
                listeners.append(&mut self.listeners);
                self.listeners = listeners;
            }

            if matches!(queued.event, AnimationStateEvent::End) {
                self.free_entry(entry_id);
            } else if let Some(listener) = entry_listener {
                self.restore_entry_listener(entry_id, listener);
            }
        }

        self.draining_events = false;
    }
}
