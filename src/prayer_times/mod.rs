pub mod resolver;
pub mod timetable;

pub use resolver::resolve_next;
pub use timetable::{DayTimes, JsonFileTimetable, Timetable, TimetableSource};
