pub mod id;
pub mod os_signals;
pub mod statistics;
