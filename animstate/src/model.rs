use crate::Error;
use std::collections::HashMap;
use std::sync::Arc;

/// A user event keyed on an animation's timeline.
///
/// The payload fields mirror what animation tools usually export: a name plus
/// optional int, float and string values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub time: f32,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub int_value: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub float_value: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub string: String,
}

impl Event {
    pub fn new(time: f32, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
            int_value: 0,
            float_value: 0.0,
            string: String::new(),
        }
    }

    pub fn with_int(mut self, value: i32) -> Self {
        self.int_value = value;
        self
    }

    pub fn with_float(mut self, value: f32) -> Self {
        self.float_value = value;
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.string = value.into();
        self
    }
}

/// Events of one animation, sorted by fire time.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<Event>", into = "Vec<Event>"))]
pub struct EventTimeline {
    pub events: Vec<Event>,
}

impl EventTimeline {
    pub fn new(mut events: Vec<Event>) -> Self {
        // Stable: events sharing a frame keep their authored order.
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<Event>> for EventTimeline {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

impl From<EventTimeline> for Vec<Event> {
    fn from(timeline: EventTimeline) -> Self {
        timeline.events
    }
}

/// Immutable animation definition as seen by the state machine: a duration and
/// the user events it fires. Pose data lives with the caller's `PoseTarget`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Animation {
    pub name: String,
    pub duration: f32,
    #[cfg_attr(feature = "serde", serde(default, rename = "events"))]
    pub event_timeline: Option<EventTimeline>,
}

impl Animation {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            event_timeline: None,
        }
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.event_timeline = if events.is_empty() {
            None
        } else {
            Some(EventTimeline::new(events))
        };
        self
    }

    pub fn events(&self) -> &[Event] {
        self.event_timeline
            .as_ref()
            .map(|t| t.events.as_slice())
            .unwrap_or(&[])
    }

    fn validate(&self) -> Result<(), Error> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(Error::invalid_value(format!(
                "duration of animation '{}' must be finite and >= 0",
                self.name
            )));
        }
        if self.events().iter().any(|e| !e.time.is_finite()) {
            return Err(Error::invalid_value(format!(
                "event times of animation '{}' must be finite",
                self.name
            )));
        }
        Ok(())
    }
}

/// Named, indexed collection of animations. The index of an animation is the
/// stable id reported in track entry snapshots.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<Animation>", into = "Vec<Animation>")
)]
pub struct AnimationSet {
    animations: Vec<Arc<Animation>>,
    animation_index: HashMap<String, usize>,
}

impl AnimationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_animations(
        animations: impl IntoIterator<Item = Animation>,
    ) -> Result<Self, Error> {
        let mut set = Self::new();
        for animation in animations {
            set.push(animation)?;
        }
        Ok(set)
    }

    pub fn push(&mut self, animation: Animation) -> Result<usize, Error> {
        animation.validate()?;
        if self.animation_index.contains_key(&animation.name) {
            return Err(Error::DuplicateAnimation {
                name: animation.name,
            });
        }
        let index = self.animations.len();
        self.animation_index.insert(animation.name.clone(), index);
        self.animations.push(Arc::new(animation));
        Ok(index)
    }

    pub fn animation(&self, name: &str) -> Option<(usize, &Arc<Animation>)> {
        let index = *self.animation_index.get(name)?;
        Some((index, &self.animations[index]))
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Animation>> {
        self.animations.get(index)
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Animation>> {
        self.animations.iter()
    }
}

impl TryFrom<Vec<Animation>> for AnimationSet {
    type Error = Error;

    fn try_from(animations: Vec<Animation>) -> Result<Self, Self::Error> {
        Self::from_animations(animations)
    }
}

impl From<AnimationSet> for Vec<Animation> {
    fn from(set: AnimationSet) -> Self {
        set.animations
            .into_iter()
            .map(Arc::unwrap_or_clone)
            .collect()
    }
}
