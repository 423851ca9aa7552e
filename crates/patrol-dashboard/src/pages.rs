pub mod crud;
mod dashboard;
pub mod data_state;
mod login;
mod patrols;
mod users;

pub use dashboard::UiDashboard;
pub use login::UiLogin;
pub use patrols::UiPatrols;
pub use users::UiUsers;
