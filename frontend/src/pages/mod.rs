mod charts;
mod dashboard;
mod login;
mod payment;
mod settings;

pub use charts::ChartsPage;
pub use dashboard::DashboardPage;
pub use login::AuthScreen;
pub use settings::SettingsPage;
