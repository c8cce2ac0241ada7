mod animation_state;
mod event_timeline;
mod listener;
mod pose;
mod state_data;
mod track_entry;

pub use animation_state::*;
pub use listener::*;
pub use pose::*;
pub use state_data::*;
pub use track_entry::TrackEntry;
pub use track_entry::TrackEntryHandle;
pub use track_entry::TrackEntrySnapshot;

#[cfg(test)]
mod test_support;



#[cfg(test)]
mod event_timeline_tests;
