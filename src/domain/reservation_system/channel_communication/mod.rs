pub mod channel;
pub mod codec;
pub mod listener;
pub mod protocol;
