// Library exports for EmotiCart - emotion-aware shopping kiosk

pub mod annotate;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod error;
pub mod kiosk;
pub mod models;
pub mod perception;
pub mod presentation;
pub mod session;
pub mod ui;
