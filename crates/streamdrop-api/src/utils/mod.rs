pub mod html;
pub mod range;
