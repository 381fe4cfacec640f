pub mod catalog;
pub mod config;
pub mod devserver;
pub mod dom;
pub mod hovercard;
pub mod media;
pub mod preview;
pub mod server;
#[doc(hidden)]
pub mod test_support;
