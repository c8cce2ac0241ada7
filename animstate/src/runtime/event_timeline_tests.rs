use super::event_timeline::{BEFORE_START, collect_events, scan_track_time};
use crate::{AnimationStateEvent, Event, EventTimeline};

#[derive(Debug, PartialEq)]
enum Fired {
    Event(char),
    Complete(u32),
}

fn make_timeline(frames: &[f32]) -> (EventTimeline, Vec<char>) {
    let mut names = Vec::with_capacity(frames.len());
    let mut events = Vec::with_capacity(frames.len());
    for (i, &time) in frames.iter().enumerate() {
        let ch = (b'a' + (i as u8)) as char;
        names.push(ch);
        events.push(Event::new(time, "event").with_string(ch.to_string()));
    }
    (EventTimeline::new(events), names)
}

fn to_fired(events: Vec<AnimationStateEvent>) -> Vec<Fired> {
    events
        .into_iter()
        .filter_map(|event| match event {
            AnimationStateEvent::Event(ev) => ev.string.chars().next().map(Fired::Event),
            AnimationStateEvent::Complete { loop_count } => Some(Fired::Complete(loop_count)),
            _ => None,
        })
        .collect()
}

/// Scans `[0, time_end]` in steps of `time_step` the way `apply` does, one
/// interval per frame.
fn fire(frames: &[f32], time_end: f32, time_step: f32, looped: bool) -> Vec<Fired> {
    let (timeline, _) = make_timeline(frames);
    let duration = frames.iter().copied().fold(0.0f32, f32::max);

    let mut out = Vec::new();
    let mut last_time = BEFORE_START;
    let mut loops = 0;
    let mut i = 0u32;
    loop {
        let time = (time_step * i as f32).min(time_end);
        loops = scan_track_time(
            Some(&timeline),
            duration,
            looped,
            last_time,
            time,
            loops,
            &mut out,
        );
        if time >= time_end {
            break;
        }
        last_time = time;
        i += 1;
    }
    to_fired(out)
}

fn expected(frames: &[f32], time_end: f32, looped: bool) -> Vec<Fired> {
    let (_, names) = make_timeline(frames);
    let duration = frames.iter().copied().fold(0.0f32, f32::max);
    let names = &names;
    let upto = move |limit: f32| {
        frames
            .iter()
            .zip(names)
            .filter(move |(time, _)| **time <= limit)
            .map(|(_, name)| Fired::Event(*name))
    };

    let mut out = Vec::new();
    if !looped || duration == 0.0 {
        out.extend(upto(time_end));
        if time_end >= duration {
            out.push(Fired::Complete(1));
        }
        return out;
    }

    let local = time_end % duration;
    let loops = ((time_end - local) / duration).round() as u32;
    for k in 0..loops {
        out.extend(upto(duration));
        out.push(Fired::Complete(k + 1));
    }
    out.extend(upto(local));
    out
}

fn run(frames: &[f32], time_end: f32, time_step: f32) {
    assert_eq!(
        fire(frames, time_end, time_step, false),
        expected(frames, time_end, false),
        "non-looping frames={frames:?} time_end={time_end} time_step={time_step}"
    );
    let duration = frames.iter().copied().fold(0.0f32, f32::max);
    if duration > 0.0 {
        assert_eq!(
            fire(frames, time_end, time_step, true),
            expected(frames, time_end, true),
            "looping frames={frames:?} time_end={time_end} time_step={time_step}"
        );
    }
}

fn test_frames(frames: &[f32]) {
    let max_frame = frames.iter().copied().fold(0.0f32, f32::max);

    run(frames, 99.0, 0.1);
    run(frames, max_frame, 0.1);
    run(frames, 999.0, 2.0);
    run(frames, max_frame, (max_frame / 100.0).ceil().max(0.1));
    run(frames, 999.0, 100.0);

    let epsilon = 0.02;
    if max_frame > epsilon {
        run(frames, max_frame - epsilon, 0.1);
    }
}

#[test]
fn event_timeline_frame_sweeps() {
    test_frames(&[0.0]);
    test_frames(&[1.0]);
    test_frames(&[1.0, 1.0]);
    test_frames(&[1.0, 2.0]);
    test_frames(&[1.0, 2.0, 3.0]);
    test_frames(&[0.0, 0.0, 0.0]);
    test_frames(&[0.0, 0.0, 1.0]);
    test_frames(&[0.0, 1.0, 1.0]);
    test_frames(&[1.0, 1.0, 1.0]);
    test_frames(&[1.0, 2.0, 3.0, 4.0]);
    test_frames(&[0.0, 2.0, 3.0, 4.0]);
    test_frames(&[0.0, 2.0, 2.0, 4.0]);
    test_frames(&[2.0, 2.0, 2.0, 2.0]);
    test_frames(&[0.5]);
    test_frames(&[0.5, 0.5]);
    test_frames(&[0.5, 50.0]);
    test_frames(&[0.25, 0.5, 0.75, 1.0]);
    test_frames(&[
        1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 6.0, 7.0, 7.0, 8.0, 9.0, 10.0, 11.0, 11.5, 12.0, 12.0, 12.0,
        12.0,
    ]);
}

#[test]
fn interval_is_open_at_start_and_closed_at_end() {
    let (timeline, _) = make_timeline(&[0.0, 0.5, 1.0]);
    let mut out = Vec::new();

    collect_events(&timeline, 0.0, 0.5, &mut out);
    assert_eq!(to_fired(std::mem::take(&mut out)), vec![Fired::Event('b')]);

    collect_events(&timeline, BEFORE_START, 0.0, &mut out);
    assert_eq!(to_fired(std::mem::take(&mut out)), vec![Fired::Event('a')]);

    collect_events(&timeline, 0.5, 0.5, &mut out);
    assert!(out.is_empty());
}

#[test]
fn events_sharing_a_time_keep_authored_order() {
    let timeline = EventTimeline::new(vec![
        Event::new(0.5, "x").with_string("late"),
        Event::new(0.25, "y").with_string("first"),
        Event::new(0.5, "z").with_string("later"),
    ]);
    let names: Vec<_> = timeline.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["y", "x", "z"]);
}

#[test]
fn looping_scan_interleaves_events_and_completes() {
    let (timeline, _) = make_timeline(&[0.0, 0.5, 1.0]);
    let mut out = Vec::new();

    let loops = scan_track_time(Some(&timeline), 1.0, true, 0.75, 2.25, 0, &mut out);

    assert_eq!(loops, 2);
    assert_eq!(
        to_fired(out),
        vec![
            Fired::Event('c'),
            Fired::Complete(1),
            Fired::Event('a'),
            Fired::Event('b'),
            Fired::Event('c'),
            Fired::Complete(2),
            Fired::Event('a'),
        ]
    );
}

#[test]
fn disabled_timeline_still_reports_completion() {
    let mut out = Vec::new();

    let loops = scan_track_time(None, 1.0, false, 0.5, 1.5, 0, &mut out);

    assert_eq!(loops, 1);
    assert_eq!(to_fired(out), vec![Fired::Complete(1)]);
}

#[test]
fn zero_duration_loop_completes_on_each_advancing_scan() {
    let (timeline, _) = make_timeline(&[0.0]);
    let mut out = Vec::new();

    let loops = scan_track_time(Some(&timeline), 0.0, true, BEFORE_START, 0.1, 0, &mut out);
    let loops = scan_track_time(Some(&timeline), 0.0, true, 0.1, 0.2, loops, &mut out);
    let loops = scan_track_time(Some(&timeline), 0.0, true, 0.2, 0.2, loops, &mut out);

    assert_eq!(loops, 2);
    assert_eq!(
        to_fired(out),
        vec![Fired::Event('a'), Fired::Complete(1), Fired::Complete(2)]
    );
}

#[test]
fn loop_count_saturates_for_huge_track_times() {
    let mut out = Vec::new();

    let loops = scan_track_time(None, 1.0, true, 8.0e9, 8.0e9, 7, &mut out);

    assert_eq!(loops, u32::MAX);
    assert!(out.is_empty());
}
