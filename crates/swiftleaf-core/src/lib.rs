pub mod cancellation;
pub mod chunk;
pub mod chunker;
pub mod clock;
pub mod config;
pub mod library;
pub mod ocr;
pub mod scheduler;
pub mod services;
pub mod session;
pub mod study;
pub mod text_utils;
pub mod timer;
