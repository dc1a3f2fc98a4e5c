use dotenv::dotenv;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "un segreto meno bello";

#[derive(Debug, Clone)]
pub struct Config {
    pub image_host_url: String,
    pub image_upload_preset: String,
    pub push_relay_url: String,
    pub authenticity_url: String,
    pub model_generator_url: String,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub message_page_size: usize,
    pub post_page_size: usize,
    pub typing_window_ms: u64,
    pub read_sweep_interval_ms: u64,
    /// Nessun limite se assente: un upload bloccato resta "uploading"
    pub http_timeout_secs: Option<u64>,
    pub app_env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_host_url: "https://api.cloudinary.com/v1_1/demo/image/upload".to_string(),
            image_upload_preset: "barter_assets".to_string(),
            push_relay_url: "http://127.0.0.1:3001/api/send-notification".to_string(),
            authenticity_url: "http://127.0.0.1:3002/analyze".to_string(),
            model_generator_url: "http://127.0.0.1:3003/convert-image".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            message_page_size: 20,
            post_page_size: 10,
            typing_window_ms: 5_000,
            read_sweep_interval_ms: 5_000,
            http_timeout_secs: None,
            app_env: "development".to_string(),
        }
    }
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente; ogni variabile assente prende il default
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Costruisce la configurazione leggendo ogni variabile tramite `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            defaults.jwt_secret.clone()
        });

        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(parse_positive("HTTP_TIMEOUT_SECS", Some(raw), 0)?),
            None => defaults.http_timeout_secs,
        };

        Ok(Config {
            image_host_url: lookup("IMAGE_HOST_URL").unwrap_or(defaults.image_host_url),
            image_upload_preset: lookup("IMAGE_UPLOAD_PRESET")
                .unwrap_or(defaults.image_upload_preset),
            push_relay_url: lookup("PUSH_RELAY_URL").unwrap_or(defaults.push_relay_url),
            authenticity_url: lookup("AUTHENTICITY_URL").unwrap_or(defaults.authenticity_url),
            model_generator_url: lookup("MODEL_GENERATOR_URL")
                .unwrap_or(defaults.model_generator_url),
            jwt_secret,
            bcrypt_cost: parse_positive("BCRYPT_COST", lookup("BCRYPT_COST"), defaults.bcrypt_cost)?,
            message_page_size: parse_positive(
                "MESSAGE_PAGE_SIZE",
                lookup("MESSAGE_PAGE_SIZE"),
                defaults.message_page_size,
            )?,
            post_page_size: parse_positive(
                "POST_PAGE_SIZE",
                lookup("POST_PAGE_SIZE"),
                defaults.post_page_size,
            )?,
            typing_window_ms: parse_positive(
                "TYPING_WINDOW_MS",
                lookup("TYPING_WINDOW_MS"),
                defaults.typing_window_ms,
            )?,
            read_sweep_interval_ms: parse_positive(
                "READ_SWEEP_INTERVAL_MS",
                lookup("READ_SWEEP_INTERVAL_MS"),
                defaults.read_sweep_interval_ms,
            )?,
            http_timeout_secs,
            app_env: lookup("APP_ENV").unwrap_or(defaults.app_env),
        })
    }

    pub fn typing_window(&self) -> Duration {
        Duration::from_millis(self.typing_window_ms)
    }

    pub fn read_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.read_sweep_interval_ms)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!(environment = %self.app_env, "Client configuration");
        info!(
            image_host = %Self::mask_url(&self.image_host_url),
            push_relay = %Self::mask_url(&self.push_relay_url),
            authenticity = %Self::mask_url(&self.authenticity_url),
            model_generator = %Self::mask_url(&self.model_generator_url),
            "Remote services"
        );
        info!(
            message_page_size = self.message_page_size,
            post_page_size = self.post_page_size,
            typing_window_ms = self.typing_window_ms,
            read_sweep_interval_ms = self.read_sweep_interval_ms,
            http_timeout_secs = ?self.http_timeout_secs,
            "Chat tuning"
        );
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("JWT secret: custom secret configured");
        }
    }

    /// Maschera le credenziali eventualmente presenti nell'URL
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        url.to_string()
    }
}

/// Legge un valore numerico strettamente positivo: un intervallo nullo fa panicare
/// il ticker dello sweep e una pagina vuota rompe il calcolo di has_more
fn parse_positive<T>(name: &str, raw: Option<String>, default: T) -> Result<T, String>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(format!("Invalid {}: must be a positive number", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn mask_url_hides_credentials() {
        assert_eq!(
            Config::mask_url("https://user:pw@relay.example.com/send"),
            "https://***@relay.example.com/send"
        );
        assert_eq!(
            Config::mask_url("https://relay.example.com/send"),
            "https://relay.example.com/send"
        );
    }

    #[test]
    fn defaults_match_chat_timings() {
        let config = Config::default();
        assert_eq!(config.message_page_size, 20);
        assert_eq!(config.post_page_size, 10);
        assert_eq!(config.typing_window(), Duration::from_secs(5));
        assert_eq!(config.read_sweep_interval(), Duration::from_secs(5));
        assert_eq!(config.http_timeout(), None);
    }

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn zero_tuning_values_are_rejected() {
        for name in [
            "MESSAGE_PAGE_SIZE",
            "POST_PAGE_SIZE",
            "TYPING_WINDOW_MS",
            "READ_SWEEP_INTERVAL_MS",
            "HTTP_TIMEOUT_SECS",
        ] {
            let err = Config::from_lookup(lookup_from(&[(name, "0")])).unwrap_err();
            assert_eq!(err, format!("Invalid {}: must be a positive number", name));
        }

        let err = Config::from_lookup(lookup_from(&[("MESSAGE_PAGE_SIZE", "-3")])).unwrap_err();
        assert!(err.contains("MESSAGE_PAGE_SIZE"));
    }

    #[test]
    fn positive_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("MESSAGE_PAGE_SIZE", "30"),
            ("READ_SWEEP_INTERVAL_MS", " 250 "),
            ("HTTP_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.message_page_size, 30);
        assert_eq!(config.read_sweep_interval(), Duration::from_millis(250));
        assert_eq!(config.http_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.post_page_size, 10);

        let unset = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(unset.http_timeout(), None);
    }
}
