pub mod campaign;
pub mod image;
pub mod request;

pub use campaign::*;
pub use image::*;
pub use request::*;
