pub mod booking;
pub mod conflict;
pub mod ledger;
pub mod lifecycle;
pub mod locks;
pub mod policy;
pub mod scheduling;
pub mod slots;

pub use booking::BookingCoordinator;
pub use ledger::AppointmentLedger;
pub use lifecycle::AppointmentLifecycleService;
pub use locks::{SlotGuard, SlotLockTable};
pub use policy::{authorize, evaluate, AppointmentParties, Decision, DenyReason, Operation};
pub use scheduling::SchedulingService;
pub use slots::SlotRegistry;
