pub mod image;
pub mod provider;
pub mod request;

pub use image::*;
pub use provider::*;
pub use request::*;
