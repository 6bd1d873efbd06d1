//! Guided goal setup: category detection, discovery questions and suggested
//! domains.

pub mod data;
pub mod endpoints;
pub mod util;
