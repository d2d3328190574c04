mod adapter;

pub use adapter::{StonFiAdapter, cross_swap_body};
