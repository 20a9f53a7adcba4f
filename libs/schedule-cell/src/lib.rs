pub mod clock;
pub mod models;
pub mod refresh;
pub mod services;
pub mod timeutil;

// Re-export the main entry points for consumers building screens on this cell
pub use clock::{Clock, FixedClock, SystemClock};
pub use models::{
    AvailabilityPayload, AvailabilityTemplate, DayDraft, DayOfWeek, ScheduleRefreshEvent,
    ScheduleSlot, ScheduleSlotPayload, SlotStatus, WeekDraft,
};
pub use refresh::{ScheduleRefreshBus, Subscription};
pub use services::availability::{AvailabilityApi, AvailabilityClient};
pub use services::composer::{
    ComposerState, SaveOutcome, WeeklyAvailabilityComposer, MAX_WEEK_OFFSET, SAVED_CLOSE_DELAY_MS,
};
pub use services::schedule::ScheduleClient;
pub use services::slot_display::WeekSlotOverview;
