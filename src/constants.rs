pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const OPEN_METEO_BASE_URL: &str = "https://air-quality-api.open-meteo.com";
pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

pub const OPENWEATHER_SOURCE_NAME: &str = "OpenWeatherMap";
pub const OPEN_METEO_SOURCE_NAME: &str = "Open-Meteo";

pub const OPEN_METEO_HOURLY_PARAMETERS: [&str; 7] = [
    "pm10",
    "pm2_5",
    "carbon_monoxide",
    "nitrogen_dioxide",
    "sulphur_dioxide",
    "ozone",
    "ammonia",
];

pub const DEFAULT_UNIT: &str = "µg/m³";
pub const CURRENT_LOOKBACK_HOURS: i64 = 24;
pub const EXTREMES_WINDOW_DAYS: i64 = 30;

pub const LEVEL_GOOD_MAX: f64 = 15.0;
pub const LEVEL_MODERATE_MAX: f64 = 35.0;
pub const LEVEL_UNHEALTHY_MAX: f64 = 55.0;

pub const DUST_LOW_MAX: f64 = 10.0;
pub const DUST_MODERATE_MAX: f64 = 25.0;
pub const DUST_HIGH_MAX: f64 = 50.0;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8790";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const CONNECT_TIMEOUT_SECONDS: u64 = 8;
pub const USER_AGENT: &str = "airq-map/0.1";
pub const MAX_CLIENT_SESSIONS: usize = 1024;
pub const MAX_CLIENT_ID_LEN: usize = 64;

pub const ERROR_MESSAGE: &str =
    "Could not load air quality data for this location. Please try again in a moment.";
