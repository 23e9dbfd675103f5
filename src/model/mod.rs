pub mod attendance;
pub mod break_record;
pub mod role;
pub mod user;
