pub mod bench;
pub mod html;
