pub mod decision;
pub mod scheduling_engine;
