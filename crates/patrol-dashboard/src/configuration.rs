use patrol_shared::const_config::client::{
    poll::POLL_DEFAULT_INTERVAL,
    screens::{
        SCREEN_DEFAULT_PAGE_SIZE, SCREEN_PATROLS_DEBOUNCE, SCREEN_TOAST_DURATION,
        SCREEN_USERS_DEBOUNCE,
    },
    CLIENT_DEFAULT_BASE_URL,
};
use patrol_time::Millis;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
pub struct Configuration {
    pub backend: BackendSettings,
    pub dashboard: DashboardSettings,
    pub screens: ScreenSettings,
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
pub struct BackendSettings {
    /// `/api` is added when missing
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
pub struct DashboardSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_ms: u64,
}

#[derive(serde::Deserialize, Clone, Debug, PartialEq)]
pub struct ScreenSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_size: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub users_debounce_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub patrols_debounce_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub toast_ms: u64,
}

impl DashboardSettings {
    pub fn poll_interval(&self) -> Millis {
        self.poll_interval_ms.into()
    }
}

impl ScreenSettings {
    pub fn users_debounce(&self) -> Millis {
        self.users_debounce_ms.into()
    }

    pub fn patrols_debounce(&self) -> Millis {
        self.patrols_debounce_ms.into()
    }

    pub fn toast_duration(&self) -> Millis {
        self.toast_ms.into()
    }
}

/// Compiled in values, what the web build always uses
impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend: BackendSettings {
                base_url: CLIENT_DEFAULT_BASE_URL.to_string(),
            },
            dashboard: DashboardSettings {
                poll_interval_ms: POLL_DEFAULT_INTERVAL.as_u64(),
            },
            screens: ScreenSettings {
                page_size: SCREEN_DEFAULT_PAGE_SIZE,
                users_debounce_ms: SCREEN_USERS_DEBOUNCE.as_u64(),
                patrols_debounce_ms: SCREEN_PATROLS_DEBOUNCE.as_u64(),
                toast_ms: SCREEN_TOAST_DURATION.as_u64(),
            },
        }
    }
}

/// Reads `configuration/base.toml` then `configuration/<APP_ENVIRONMENT>.toml`
/// then `APP_` environment variables
#[cfg(not(target_arch = "wasm32"))]
pub fn get_configuration() -> anyhow::Result<Configuration> {
    use anyhow::Context as _;

    let base_path = std::env::current_dir().context("failed to determine the current directory")?;
    let configuration_directory = base_path.join("configuration");

    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let environment_filename = format!("{}.toml", environment.as_str());
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.toml")))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename))
                .required(false),
        )
        // E.g. `APP_BACKEND__BASE_URL=http://10.0.0.5:5000` sets `backend.base_url`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<Configuration>()?)
}

/// Falls back to the compiled in values if the files cannot be read
#[cfg(not(target_arch = "wasm32"))]
pub fn get_configuration_or_default() -> Configuration {
    match get_configuration() {
        Ok(configuration) => configuration,
        Err(e) => {
            tracing::warn!(?e, "failed to load configuration, using defaults");
            Configuration::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn get_configuration_or_default() -> Configuration {
    Configuration::default()
}

/// The possible runtime environment for our application.
#[derive(Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("local", Ok(Environment::Local))]
    #[case("Production", Ok(Environment::Production))]
    #[case("staging", Err(()))]
    fn environment_parsing(#[case] input: &str, #[case] expected: Result<Environment, ()>) {
        let actual = Environment::try_from(input.to_string()).map_err(|_| ());
        assert_eq!(actual, expected);
    }

    #[test]
    fn defaults_match_constants() {
        let actual = Configuration::default();
        assert_eq!(actual.dashboard.poll_interval(), Millis::new(5000));
        assert_eq!(actual.screens.users_debounce(), Millis::new(300));
        assert_eq!(actual.screens.patrols_debounce(), Millis::new(250));
        assert_eq!(actual.screens.page_size, 10);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn base_file_matches_defaults() {
        // Tests start in the crate root so the configuration folder is found
        let settings = config::Config::builder()
            .add_source(config::File::from(
                std::path::Path::new("configuration").join("base.toml"),
            ))
            .build()
            .unwrap();
        let actual: Configuration = settings.try_deserialize().unwrap();
        assert_eq!(actual, Configuration::default());
    }
}
