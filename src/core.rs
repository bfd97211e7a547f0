//! The protocol core: state machines, sessions and the retransmission timer.
//! 协议核心：状态机、会话和重传定时器。

pub mod receiver;
pub mod registry;
pub mod sender;
pub mod session;
pub mod timer;
pub mod traits;

#[cfg(test)]
mod tests;
#[cfg(test)]
pub mod test_utils;
