pub mod schedule_state;
pub mod slot_capacity_table;
