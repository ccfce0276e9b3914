pub mod reservation_system;
pub mod simulator;
