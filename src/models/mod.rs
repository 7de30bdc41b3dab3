pub mod event;
pub mod prayer;
pub mod settings;
pub mod state;

pub use event::ResolvedEvent;
pub use prayer::PrayerType;
pub use settings::{Language, Settings};
pub use state::{ErrorState, ReadyState, StateSnapshot};
