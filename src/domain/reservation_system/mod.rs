pub mod agent;
pub mod agent_registry;
pub mod channel_communication;
pub mod config;
pub mod controller;
pub mod report;
pub mod reservation;
pub mod schedule;
pub mod scheduler;
pub mod utils;
