mod helpers;
mod list_screens;
mod login_to_dashboard;
