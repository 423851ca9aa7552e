mod auth_refresh;
mod helpers;
mod locations;
mod login;
mod patrols;
mod session_guard;
mod users;
