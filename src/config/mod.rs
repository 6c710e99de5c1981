pub mod app;

pub use app::{build_source, AppConfig};
