pub mod scrollbox;

pub use scrollbox::*;
