use crate::{AnimationState, Event, TrackEntrySnapshot};

/// Lifecycle notifications produced by an [`AnimationState`].
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationStateEvent {
    Start,
    Interrupt,
    End,
    Complete { loop_count: u32 },
    Event(Event),
}

impl AnimationStateEvent {
    pub(crate) fn notify(
        &self,
        listener: &mut dyn AnimationStateListener,
        state: &mut AnimationState,
        entry: &TrackEntrySnapshot,
    ) {
        match self {
            Self::Start => listener.start(state, entry),
            Self::Interrupt => listener.interrupt(state, entry),
            Self::End => listener.end(state, entry),
            Self::Complete { loop_count } => listener.complete(state, entry, *loop_count),
            Self::Event(event) => listener.event(state, entry, event),
        }
    }
}

/// Observer of track entry lifecycles. Every callback defaults to a no-op so
/// implementors only override what they care about.
///
/// Callbacks run synchronously from `apply` (and from `set_animation`,
/// `add_animation` and `clear_track*`, which notify immediately). The state is
/// handed back mutably so a listener may queue or replace animations; the
/// notifications that causes are delivered after the current one.
pub trait AnimationStateListener {
    fn start(&mut self, _state: &mut AnimationState, _entry: &TrackEntrySnapshot) {}

    fn interrupt(&mut self, _state: &mut AnimationState, _entry: &TrackEntrySnapshot) {}

    fn end(&mut self, _state: &mut AnimationState, _entry: &TrackEntrySnapshot) {}

    fn complete(
        &mut self,
        _state: &mut AnimationState,
        _entry: &TrackEntrySnapshot,
        _loop_count: u32,
    ) {
    }

    fn event(&mut self, _state: &mut AnimationState, _entry: &TrackEntrySnapshot, _event: &Event) {}
}

/// Per-entry listeners implement the same capability set, attached with
/// [`crate::TrackEntryHandle::set_listener`] and called before the state's.
pub use self::AnimationStateListener as TrackEntryListener;
