pub mod priority;
pub mod reading;

pub use priority::*;
pub use reading::*;
