mod adapter;

pub use adapter::{DeDustAdapter, swap_params};
