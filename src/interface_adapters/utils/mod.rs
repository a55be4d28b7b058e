// Small runtime helpers: ids, clocks and generated names.

pub mod clock;
pub mod ids;
pub mod names;
