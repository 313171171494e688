pub mod codec;
mod source;

pub use source::IcalReleaseScheduleSource;
