pub mod form;
pub mod html;
pub mod keys;
pub mod time;
