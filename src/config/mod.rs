pub mod app;
pub mod settings;

pub use app::AppConfig;
pub use settings::{load_settings_default, RegistrationConfig, Settings};
