use crate::runtime::{
    AnimationState, AnimationStateData, AnimationStateListener, TrackEntrySnapshot,
};
use crate::{Animation, AnimationSet, Event};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ResultRow {
    pub(crate) animation_index: usize,
    pub(crate) name: String,
    pub(crate) track_time: f32,
    pub(crate) total_time: f32,
}

pub(crate) fn row(animation_index: usize, name: &str, track_time: f32, total_time: f32) -> ResultRow {
    ResultRow {
        animation_index,
        name: name.to_string(),
        track_time,
        total_time,
    }
}

#[derive(Clone, Default)]
pub(crate) struct Recording {
    pub(crate) time: Rc<Cell<f32>>,
    pub(crate) rows: Rc<RefCell<Vec<ResultRow>>>,
}

impl Recording {
    pub(crate) fn take(&self) -> Vec<ResultRow> {
        std::mem::take(&mut *self.rows.borrow_mut())
    }

    fn push(&self, entry: &TrackEntrySnapshot, name: String) {
        self.rows.borrow_mut().push(ResultRow {
            animation_index: entry.animation_index,
            name,
            track_time: round3(entry.track_time),
            total_time: round3(self.time.get()),
        });
    }
}

pub(crate) struct RecordingListener {
    pub(crate) recording: Recording,
}

impl AnimationStateListener for RecordingListener {
    fn start(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot) {
        self.recording.push(entry, "start".to_string());
    }

    fn interrupt(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot) {
        self.recording.push(entry, "interrupt".to_string());
    }

    fn end(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot) {
        self.recording.push(entry, "end".to_string());
    }

    fn complete(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot, loop_count: u32) {
        self.recording.push(entry, format!("complete {loop_count}"));
    }

    fn event(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot, event: &Event) {
        self.recording.push(entry, format!("event {}", event.string));
    }
}

pub(crate) fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

fn events_animation(name: &str) -> Animation {
    Animation::new(name, 1.0).with_events(vec![
        Event::new(0.0, "event").with_string("0"),
        Event::new(14.0 / 30.0, "event").with_string("14"),
        Event::new(1.0, "event").with_string("30"),
    ])
}

/// Two one-second animations, `events1` (index 0) and `events2` (index 1),
/// each firing events at frames 0, 14 and 30 of a 30 fps timeline.
pub(crate) fn test_animations() -> Arc<AnimationSet> {
    let set = AnimationSet::from_animations([events_animation("events1"), events_animation("events2")])
        .unwrap();
    Arc::new(set)
}

pub(crate) fn setup() -> (AnimationState, Recording) {
    let mut state = AnimationState::new(AnimationStateData::new(test_animations()));
    let recording = Recording::default();
    state.add_listener(RecordingListener {
        recording: recording.clone(),
    });
    (state, recording)
}

pub(crate) fn run(state: &mut AnimationState, recording: &Recording, step: f32, end_time: f32) {
    run_with_frame(state, recording, step, end_time, |_, _| {});
}

/// Applies once at time 0, then steps until `end_time`. `on_frame` runs before
/// each update with the rounded frame time.
pub(crate) fn run_with_frame<F: FnMut(f32, &mut AnimationState)>(
    state: &mut AnimationState,
    recording: &Recording,
    step: f32,
    end_time: f32,
    mut on_frame: F,
) {
    recording.time.set(0.0);
    state.apply(&mut ());

    let mut time = 0.0f32;
    while time < end_time {
        time += step;
        recording.time.set(time);
        on_frame(round3(time), state);
        state.update(step);
        // Apply several times per frame: a repeated apply must not fire anything again.
        state.apply(&mut ());
        state.apply(&mut ());
        state.apply(&mut ());
    }
}
