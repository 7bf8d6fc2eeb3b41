pub mod availability;
pub mod domain;
pub mod ports;

pub use availability::{
    active_schedule_conflict, dated_slot_active_on, recurring_slot_active_at,
    resolve_available_now, validate_timezone, validate_weekly_slots, WeeklySlot, WeeklySlotInput,
};
pub use domain::{
    AvailabilityException, DatedSlot, DomainError, Profile, ProfileSubject, RecurringSlot, Role,
    Session, SessionStatus, Subject, TimeOfDay,
};
pub use ports::{
    DatedSlotPatch, NewException, PortError, PortResult, ProfilePatch, StoreService, SubjectLink,
};
