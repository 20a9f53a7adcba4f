pub mod availability;
pub mod composer;
pub mod schedule;
pub mod slot_display;

pub use availability::{AvailabilityApi, AvailabilityClient};
pub use composer::WeeklyAvailabilityComposer;
pub use schedule::ScheduleClient;
pub use slot_display::WeekSlotOverview;
