mod poll;
mod types;

pub use poll::{PollOptions, PollSchedule};
pub use types::{JobHandle, JobStatus, ResultDescriptor, UnknownStatus};
