use animstate::{
    Animation, AnimationSet, AnimationState, AnimationStateData, AnimationStateListener, Event,
    TrackEntrySnapshot,
};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

struct Printer {
    time: Rc<Cell<f32>>,
}

impl Printer {
    fn print(&self, entry: &TrackEntrySnapshot, what: &str) {
        println!(
            "{:>3} {:<10} {:<12} {:>8.3} {:>8.3}",
            entry.track_index,
            entry.animation_name,
            what,
            entry.track_time,
            self.time.get()
        );
    }
}

impl AnimationStateListener for Printer {
    fn start(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot) {
        self.print(entry, "start");
    }

    fn interrupt(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot) {
        self.print(entry, "interrupt");
    }

    fn end(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot) {
        self.print(entry, "end");
    }

    fn complete(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot, loop_count: u32) {
        self.print(entry, &format!("complete {loop_count}"));
    }

    fn event(&mut self, _state: &mut AnimationState, entry: &TrackEntrySnapshot, event: &Event) {
        self.print(entry, &format!("event {}", event.string));
    }
}

fn events_animation(name: &str) -> Animation {
    Animation::new(name, 1.0).with_events(vec![
        Event::new(0.0, "event").with_string("0"),
        Event::new(14.0 / 30.0, "event").with_string("14"),
        Event::new(1.0, "event").with_string("30"),
    ])
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut step = 0.1f32;
    let mut end_time = 4.0f32;
    let mut mix = 0.0f32;

    let mut i = 0usize;
    while i < args.len() {
        let value = args.get(i + 1).and_then(|v| v.parse::<f32>().ok());
        match (args[i].as_str(), value) {
            ("--step", Some(v)) => step = v,
            ("--end", Some(v)) => end_time = v,
            ("--mix", Some(v)) => mix = v,
            (other, _) => {
                eprintln!("usage: event_trace [--step S] [--end T] [--mix M] (got {other:?})");
                std::process::exit(2);
            }
        }
        i += 2;
    }

    let animations = AnimationSet::from_animations([
        events_animation("events1"),
        events_animation("events2"),
    ])
    .expect("valid animations");
    let mut data = AnimationStateData::new(Arc::new(animations));
    data.set_default_mix(mix).expect("mix duration");

    let time = Rc::new(Cell::new(0.0f32));
    let mut state = AnimationState::new(data);
    state.add_listener(Printer { time: time.clone() });

    println!("{:>3} {:<10} {:<12} {:>8} {:>8}", "trk", "animation", "notify", "track", "total");
    state.set_animation(0, "events1", false).expect("set");
    state.add_animation(0, "events2", false, 0.0).expect("add");
    state.add_animation(0, "events1", true, 0.0).expect("add");
    state.apply(&mut ());

    let mut t = 0.0f32;
    while t < end_time {
        t += step;
        time.set(t);
        state.update(step);
        state.apply(&mut ());
    }
}
