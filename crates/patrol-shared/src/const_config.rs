//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

use patrol_time::Millis;

pub mod client {
    use super::*;

    /// Used when no base url is configured
    pub const CLIENT_DEFAULT_BASE_URL: &str = "http://localhost:5000";
    /// Key used to hold the bearer token in browser local storage
    pub const CLIENT_TOKEN_STORAGE_KEY: &str = "access_token";
    /// Query parameter appended to GET requests to defeat caches
    pub const CLIENT_CACHE_BUST_PARAM: &str = "_ts";

    pub mod poll {
        use super::Millis;

        pub const POLL_DEFAULT_INTERVAL: Millis = Millis::new(5000);
        /// Anything faster than this is hammering the backend
        pub const POLL_MIN_INTERVAL: Millis = Millis::new(1000);
    }

    pub mod screens {
        use super::Millis;

        pub const SCREEN_DEFAULT_PAGE_SIZE: u32 = 10;
        pub const SCREEN_PAGE_SIZES: [u32; 3] = [10, 20, 50];
        pub const SCREEN_USERS_DEBOUNCE: Millis = Millis::new(300);
        pub const SCREEN_PATROLS_DEBOUNCE: Millis = Millis::new(250);
        pub const SCREEN_TOAST_DURATION: Millis = Millis::new(2000);
        /// Used when the roles endpoint is unavailable
        pub const SCREEN_FALLBACK_ROLES: [&str; 3] = ["usuario", "patrullero", "admin"];
    }

    pub mod map {
        /// Initial camera (Guatemala City)
        pub const MAP_INITIAL_CENTER: (f64, f64) = (14.6349, -90.5069);
        pub const MAP_INITIAL_ZOOM: f64 = 12.0;
        pub const MAP_SINGLE_POINT_MIN_ZOOM: f64 = 16.0;
        pub const MAP_SINGLE_POINT_MAX_ZOOM: f64 = 18.0;
        pub const MAP_FIT_MAX_ZOOM: f64 = 17.0;
        pub const MAP_FIT_PADDING_PX: f64 = 60.0;
        /// Fraction of the view kept as an inner margin when checking if all
        /// points are still comfortably visible
        pub const MAP_SAFE_VIEW_MARGIN: f64 = 0.10;
        /// Re-centre only when the centre drifted more than this
        pub const MAP_RECENTER_THRESHOLD_METERS: f64 = 50.0;
        pub const MAP_MIN_ZOOM: f64 = 1.0;
        pub const MAP_MAX_ZOOM: f64 = 19.0;
    }
}

pub mod path {
    mod path_spec;
    pub use path_spec::PathSpec;

    pub const PATH_AUTH_LOGIN: PathSpec = PathSpec::post("/auth/login");
    pub const PATH_AUTH_LOGOUT: PathSpec = PathSpec::post("/auth/logout");
    pub const PATH_AUTH_ME: PathSpec = PathSpec::get("/auth/me");
    pub const PATH_AUTH_REFRESH: PathSpec = PathSpec::post("/auth/refresh");
    pub const PATH_LOCATIONS: PathSpec = PathSpec::get("/ubicaciones");
    pub const PATH_PATROLS: PathSpec = PathSpec::get("/patrullas");
    pub const PATH_PATROLS_CREATE: PathSpec = PathSpec::post("/patrullas");
    pub const PATH_PATROL: PathSpec = PathSpec::get("/patrullas");
    pub const PATH_PATROL_UPDATE: PathSpec = PathSpec::put("/patrullas");
    pub const PATH_PATROL_DELETE: PathSpec = PathSpec::delete("/patrullas");
    pub const PATH_USERS: PathSpec = PathSpec::get("/users");
    pub const PATH_USERS_CREATE: PathSpec = PathSpec::post("/users");
    pub const PATH_USERS_ROLES: PathSpec = PathSpec::get("/users/roles");
    pub const PATH_USER: PathSpec = PathSpec::get("/users");
    pub const PATH_USER_UPDATE: PathSpec = PathSpec::put("/users");
    pub const PATH_USER_DELETE: PathSpec = PathSpec::delete("/users");
}
