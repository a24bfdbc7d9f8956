// Brandmark watermark compositing library

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod session;
pub mod submit;
pub mod watermark;
