pub mod envelope;
pub mod health;
pub mod phase;
pub mod round;
pub mod sse;
