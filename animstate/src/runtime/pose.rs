use crate::Animation;

/// Receiver of the poses resolved by [`crate::AnimationState::apply`].
///
/// Called once per playing entry, outgoing entries of a crossfade before the
/// entry mixing in, tracks in index order. `time` is animation-local (already
/// wrapped for looping entries) and `alpha` is the entry's blend weight.
/// Entries with zero weight are skipped.
pub trait PoseTarget {
    fn apply_animation(
        &mut self,
        track_index: usize,
        animation: &Animation,
        time: f32,
        looped: bool,
        alpha: f32,
    );
}

/// Event-only playback.
impl PoseTarget for () {
    fn apply_animation(&mut self, _: usize, _: &Animation, _: f32, _: bool, _: f32) {}
}
