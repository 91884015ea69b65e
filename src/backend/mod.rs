pub mod gpu;
pub mod scalar;
