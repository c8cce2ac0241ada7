use crate::{Animation, AnimationSet, Error};
use std::collections::HashMap;
use std::sync::Arc;

/// Mix settings shared by the tracks of an [`crate::AnimationState`]: a default
/// crossfade duration plus per `(from, to)` overrides.
#[derive(Clone, Debug)]
pub struct AnimationStateData {
    pub animations: Arc<AnimationSet>,
    pub default_mix: f32,
    mixes: HashMap<(usize, usize), f32>,
}

impl AnimationStateData {
    pub fn new(animations: Arc<AnimationSet>) -> Self {
        Self {
            animations,
            default_mix: 0.0,
            mixes: HashMap::new(),
        }
    }

    pub fn set_default_mix(&mut self, duration: f32) -> Result<(), Error> {
        validate_mix_duration(duration)?;
        self.default_mix = duration;
        Ok(())
    }

    pub fn set_mix(&mut self, from: &str, to: &str, duration: f32) -> Result<(), Error> {
        validate_mix_duration(duration)?;
        let (from_index, _) = self.find_animation(from)?;
        let (to_index, _) = self.find_animation(to)?;
        self.mixes.insert((from_index, to_index), duration);
        Ok(())
    }

    /// Mix duration between two named animations, falling back to the default.
    pub fn mix(&self, from: &str, to: &str) -> Result<f32, Error> {
        let (from_index, _) = self.find_animation(from)?;
        let (to_index, _) = self.find_animation(to)?;
        Ok(self.mix_duration(from_index, to_index))
    }

    pub(crate) fn mix_duration(&self, from_index: usize, to_index: usize) -> f32 {
        self.mixes
            .get(&(from_index, to_index))
            .copied()
            .unwrap_or(self.default_mix)
    }

    pub(crate) fn find_animation(&self, name: &str) -> Result<(usize, Arc<Animation>), Error> {
        self.animations
            .animation(name)
            .map(|(index, animation)| (index, Arc::clone(animation)))
            .ok_or_else(|| Error::UnknownAnimation {
                name: name.to_string(),
            })
    }
}

fn validate_mix_duration(duration: f32) -> Result<(), Error> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(Error::invalid_value("mix duration must be finite and >= 0"));
    }
    Ok(())
}
