pub mod virtual_clock;
