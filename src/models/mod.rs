pub mod schedule;

pub use schedule::{
    IdGenerator, ScheduleConfig, ScreenSequence, SequentialIds, TimeSpecificNavigation, UuidIds,
};
