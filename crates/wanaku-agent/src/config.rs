use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use wanaku_core::{ServiceTarget, ServiceType};
use wanaku_discovery::{AuthConfig, DiscoveryConfig, RegistrationConfig};

#[derive(Parser)]
#[command(name = "wanaku-agent")]
#[command(about = "Registers a Wanaku capability service with the discovery service", long_about = None)]
pub struct Cli {
    /// Base URI of the Wanaku router exposing the discovery API
    #[arg(long, env = "WANAKU_REGISTRATION_URI", default_value = "http://localhost:8080")]
    pub registration_uri: String,

    /// Name this service registers under
    #[arg(long, env = "WANAKU_SERVICE_NAME")]
    pub service_name: String,

    /// Host the router should dial
    #[arg(long, env = "WANAKU_SERVICE_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(long, env = "WANAKU_SERVICE_PORT", default_value_t = 9190)]
    pub port: u16,

    /// resource-provider, tool-invoker, multi-capability or code-execution-engine
    #[arg(long, env = "WANAKU_SERVICE_TYPE", default_value = "tool-invoker")]
    pub service_type: ServiceType,

    #[arg(long, env = "WANAKU_SERVICE_SUB_TYPE")]
    pub service_sub_type: Option<String>,

    #[arg(long, env = "WANAKU_LANGUAGE_NAME")]
    pub language_name: Option<String>,

    #[arg(long, env = "WANAKU_LANGUAGE_TYPE")]
    pub language_type: Option<String>,

    #[arg(long, env = "WANAKU_LANGUAGE_SUB_TYPE")]
    pub language_sub_type: Option<String>,

    /// Directory holding the instance identity file
    #[arg(long, env = "WANAKU_DATA_DIR", default_value = ".wanaku")]
    pub data_dir: PathBuf,

    #[arg(long, env = "WANAKU_REGISTRATION_RETRIES", default_value_t = 3)]
    pub retries: u32,

    #[arg(long, env = "WANAKU_REGISTRATION_RETRY_WAIT_SECONDS", default_value_t = 1)]
    pub retry_wait_seconds: u64,

    #[arg(long, env = "WANAKU_REGISTRATION_DELAY_SECONDS", default_value_t = 0)]
    pub delay_seconds: u64,

    #[arg(long, env = "WANAKU_REGISTRATION_INTERVAL_SECONDS", default_value_t = 5)]
    pub interval_seconds: u64,

    #[arg(long, env = "WANAKU_REQUEST_TIMEOUT_SECONDS", default_value_t = 10)]
    pub request_timeout_seconds: u64,

    /// Token endpoint URL, or the OIDC issuer to discover it from
    #[arg(long, env = "WANAKU_AUTH_SERVER")]
    pub auth_server: String,

    #[arg(long, env = "WANAKU_CLIENT_ID")]
    pub client_id: String,

    #[arg(long, env = "WANAKU_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    #[arg(long, env = "WANAKU_AUTH_SCOPE")]
    pub scope: Option<String>,
}

impl Cli {
    pub fn target(&self) -> ServiceTarget {
        let mut target =
            ServiceTarget::new(&self.service_name, &self.host, self.port, self.service_type);
        if let Some(sub_type) = &self.service_sub_type {
            target = target.with_sub_type(sub_type);
        }
        if let Some(language) = &self.language_name {
            target = target.with_language(
                language,
                self.language_type.clone(),
                self.language_sub_type.clone(),
            );
        }
        target
    }

    pub fn registration(&self) -> RegistrationConfig {
        RegistrationConfig {
            max_retries: self.retries,
            wait_seconds: self.retry_wait_seconds,
            data_dir: self.data_dir.clone(),
            initial_delay_seconds: self.delay_seconds,
            period_seconds: self.interval_seconds,
        }
    }

    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            registry_uri: self.registration_uri.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            token_endpoint: self.auth_server.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scope: self.scope.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut args = vec![
            "wanaku-agent",
            "--service-name",
            "camel",
            "--auth-server",
            "http://localhost:8543/realms/wanaku",
            "--client-id",
            "wanaku-service",
            "--client-secret",
            "s3cr3t",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn builds_target_from_flags() {
        let cli = parse(&[
            "--service-type",
            "code-execution-engine",
            "--language-name",
            "python",
            "--port",
            "9000",
        ]);
        let target = cli.target();
        assert_eq!(target.service_type, ServiceType::CodeExecutionEngine);
        assert_eq!(target.language_name.as_deref(), Some("python"));
        assert_eq!(target.address(), "localhost:9000");
        assert!(target.id.is_none());
    }

    #[test]
    fn maps_registration_knobs() {
        let cli = parse(&["--retries", "7", "--interval-seconds", "30"]);
        let registration = cli.registration();
        assert_eq!(registration.max_retries, 7);
        assert_eq!(registration.period_seconds, 30);
        assert!(registration.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_service_type() {
        let result = Cli::try_parse_from([
            "wanaku-agent",
            "--service-name",
            "camel",
            "--service-type",
            "router",
            "--auth-server",
            "http://localhost",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
        ]);
        assert!(result.is_err());
    }
}
