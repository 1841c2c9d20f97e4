#![doc = "Measurement engine for cyclebench: clock capability, cyclic driver, and real-time setup."]

pub mod buffer;
pub mod clock;
pub mod driver;
pub mod realtime;
pub mod runner;

pub use buffer::*;
pub use clock::*;
pub use driver::*;
pub use realtime::*;
pub use runner::*;
