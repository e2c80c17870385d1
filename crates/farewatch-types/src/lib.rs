pub mod api;
pub mod models;

pub use models::{DayRecord, NewDayRecord, Price, User, Watch, WatchUpdate};
