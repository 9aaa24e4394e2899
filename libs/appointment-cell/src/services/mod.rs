pub mod availability;
pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod stats;

pub use availability::AvailabilityService;
pub use booking::AppointmentBookingService;
pub use conflict::ConflictDetectionService;
pub use lifecycle::AppointmentLifecycleService;
pub use stats::AppointmentStatsService;
