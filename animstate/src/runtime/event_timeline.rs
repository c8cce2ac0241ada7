use crate::{AnimationStateEvent, EventTimeline};

/// Sentinel lower bound that admits events keyed at time 0.
pub(crate) const BEFORE_START: f32 = -1.0;

/// Pushes the events firing in `(after, until]`, in timeline order.
///
/// The interval is half-open on the left so a frame boundary landing exactly on
/// an event fires it once: on the step that reaches it, never on the next.
pub(crate) fn collect_events(
    timeline: &EventTimeline,
    after: f32,
    until: f32,
    out: &mut Vec<AnimationStateEvent>,
) {
    if until <= after {
        return;
    }
    let start = timeline.events.partition_point(|ev| ev.time <= after);
    out.extend(
        timeline.events[start..]
            .iter()
            .take_while(|ev| ev.time <= until)
            .cloned()
            .map(AnimationStateEvent::Event),
    );
}

/// Collects the notifications for an entry whose track time moved from
/// `last_time` to `time`: user events and loop completions, interleaved so the
/// events keyed before a loop boundary precede that loop's `Complete`.
///
/// `last_time < 0` means the entry has never been scanned. Returns the number
/// of loops completed as of `time`.
pub(crate) fn scan_track_time(
    timeline: Option<&EventTimeline>,
    duration: f32,
    looped: bool,
    last_time: f32,
    time: f32,
    loops_completed: u32,
    out: &mut Vec<AnimationStateEvent>,
) -> u32 {
    let emit = |after: f32, until: f32, out: &mut Vec<AnimationStateEvent>| {
        if let Some(timeline) = timeline {
            collect_events(timeline, after, until, out);
        }
    };

    if !looped {
        let after = if last_time < 0.0 { BEFORE_START } else { last_time };
        emit(after, time.min(duration), out);
        if last_time < duration && time >= duration {
            out.push(AnimationStateEvent::Complete { loop_count: 1 });
            return 1;
        }
        return loops_completed;
    }

    if duration <= 0.0 {
        if last_time < 0.0 {
            emit(BEFORE_START, 0.0, out);
        }
        if time > last_time {
            let loop_count = loops_completed.saturating_add(1);
            out.push(AnimationStateEvent::Complete { loop_count });
            return loop_count;
        }
        return loops_completed;
    }

    let (first_loop, mut after) = if last_time < 0.0 {
        (0, BEFORE_START)
    } else {
        split_loop(last_time, duration)
    };
    let (last_loop, local_time) = split_loop(time, duration);
    for completed in first_loop..last_loop {
        emit(after, duration, out);
        out.push(AnimationStateEvent::Complete {
            loop_count: completed + 1,
        });
        after = BEFORE_START;
    }
    if time > last_time {
        emit(after, local_time, out);
    }
    last_loop.max(loops_completed)
}

/// Splits a non-negative track time into (completed loops, local time).
///
/// Both parts derive from the same remainder so they never disagree when
/// `time / duration` rounds up to the next integer. The loop count saturates
/// at `u32::MAX`.
fn split_loop(time: f32, duration: f32) -> (u32, f32) {
    let local = time % duration;
    let loops = ((time - local) / duration).round();
    if loops >= u32::MAX as f32 {
        log::debug!("loop count of track time {time} (duration {duration}) saturated");
        return (u32::MAX, local);
    }
    (loops as u32, local)
}
