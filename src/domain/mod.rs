// Domain layer - Plain data types shared by every layer
pub mod color;
pub mod error;
pub mod filter;
pub mod lmp;
pub mod view;
