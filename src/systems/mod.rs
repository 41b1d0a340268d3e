mod bookkeeping;
mod economy;
pub mod influence;
mod motion;

pub use bookkeeping::{average_eq, BookkeepingSystem};
pub use economy::{hourly_rate, update_credits, EconomySystem};
pub use motion::{advance, Motion, MotionSystem, ARRIVAL_RADIUS_PX, VILLAGER_SPEED_PX_PER_MS};
