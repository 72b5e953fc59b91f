//! Application bootstrap
//!
//! Ensures the receiver application exists and decodes uplinks with the
//! letterbox sensor formatter. Safe to re-run: an existing application is
//! left alone, the formatter is always re-applied.

use crate::config::Config;
use crate::ttn::types::{
    Application, ApplicationIdentifiers, ApplicationLink, CreateApplicationRequest,
    MessagePayloadFormatters, PayloadFormatter, SetLinkRequest,
};
use crate::ttn::{ApiError, TtnClient};
use tracing::{debug, field, info, instrument, Span};

/// Uplink decoder installed as the application's default up formatter.
///
/// Payload layout: `[_, vbat_lo, vbat_hi, s1_lo, s1_hi, s2_lo, s2_hi, threshold]`.
pub const UPLINK_DECODER: &str = include_str!("decoder.js");

/// Result of [`setup_application`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    pub app_id: String,
    /// false when the application already existed
    pub created: bool,
}

/// Turn a human-readable name into an application id.
///
/// Form-encodes the name (space → `+`, reserved bytes → `%XX`) and
/// lowercases the result. `%` and `+` are kept as-is so that sanitizing an
/// already sanitized id returns it unchanged.
pub fn sanitize_app_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut buf = [0u8; 4];
    for ch in name.chars() {
        match ch {
            ' ' => out.push('+'),
            c if c.is_ascii_alphanumeric() || "-_.~%+".contains(c) => out.push(c),
            c => out.push_str(&urlencoding::encode(c.encode_utf8(&mut buf))),
        }
    }
    out.to_lowercase()
}

/// Make sure the application `app_name` exists for `org` and has the
/// letterbox payload formatter.
#[instrument(skip_all, fields(app_id = field::Empty))]
pub async fn setup_application(
    client: &TtnClient,
    app_name: &str,
    org: &str,
    config: &Config,
) -> Result<SetupOutcome, ApiError> {
    let app_id = sanitize_app_name(app_name);
    Span::current().record("app_id", app_id.as_str());
    debug!("Sanitized AppName to {}", app_id);

    let applications = client.list_applications().await?;
    let exists = applications
        .iter()
        .any(|app| app.ids.application_id == app_id);

    if exists {
        info!("App {} exists, not creating it", app_id);
    } else {
        info!("App {} doesn't exist, creating it", app_id);
        client
            .create_application(org, &create_request(&app_id, config))
            .await?;
        info!("Application created");
    }

    client.set_link(&app_id, &formatter_request()?).await?;
    info!("Set up the formatter");

    Ok(SetupOutcome {
        app_id,
        created: !exists,
    })
}

fn create_request(app_id: &str, config: &Config) -> CreateApplicationRequest {
    let server = &config.api.server_address;
    CreateApplicationRequest {
        application: Application {
            ids: ApplicationIdentifiers {
                application_id: app_id.to_string(),
            },
            name: app_id.to_string(),
            description: config.application.description.clone(),
            application_server_address: server.clone(),
            network_server_address: server.clone(),
            join_server_address: server.clone(),
        },
    }
}

fn formatter_request() -> Result<SetLinkRequest, ApiError> {
    let link = ApplicationLink {
        default_formatters: MessagePayloadFormatters {
            up_formatter: PayloadFormatter::FormatterJavascript,
            up_formatter_parameter: UPLINK_DECODER.to_string(),
            down_formatter: PayloadFormatter::FormatterNone,
            down_formatter_parameter: String::new(),
        },
    };
    Ok(SetLinkRequest::new(link)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn client(url: String) -> TtnClient {
        TtnClient::new(url, "NNSXS.TEST", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_sanitize_app_name() {
        assert_eq!(sanitize_app_name("WB-LetterBoxSensor"), "wb-letterboxsensor");
        assert_eq!(sanitize_app_name("Test App"), "test+app");
        assert_eq!(sanitize_app_name("a/b?c"), "a%2fb%3fc");
        assert_eq!(sanitize_app_name("Grüße"), "gr%c3%bc%c3%9fe");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for name in [
            "WB-LetterBoxSensor",
            "Test App",
            "a/b?c",
            "Grüße",
            "100% + more",
            "already+sanitized%2f",
            "",
        ] {
            let once = sanitize_app_name(name);
            assert_eq!(sanitize_app_name(&once), once, "not idempotent for {:?}", name);
        }
    }

    #[test]
    fn test_decoder_script_shape() {
        assert!(UPLINK_DECODER.starts_with("function decodeUplink(input)"));
        assert!(UPLINK_DECODER.contains("decoded.threshold = input.bytes[7];"));
    }

    #[tokio::test]
    async fn test_setup_creates_missing_app() {
        let mut server = Server::new_async().await;

        let list = server
            .mock("GET", "/api/v3/applications")
            .with_status(200)
            .with_body(r#"{"applications":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let create = server
            .mock("POST", "/api/v3/users/my-org/applications")
            .match_body(Matcher::PartialJson(json!({
                "application": {
                    "ids": { "application_id": "test+app" },
                    "name": "test+app",
                    "description": "Letterbox Application",
                    "application_server_address": "eu1.cloud.thethings.network",
                    "network_server_address": "eu1.cloud.thethings.network",
                    "join_server_address": "eu1.cloud.thethings.network",
                }
            })))
            .with_status(200)
            .with_body(r#"{"ids":{"application_id":"test+app"}}"#)
            .expect(1)
            .create_async()
            .await;

        let link = server
            .mock("PUT", "/api/v3/as/applications/test+app/link")
            .match_body(Matcher::PartialJson(json!({
                "link": {
                    "default_formatters": {
                        "up_formatter": "FORMATTER_JAVASCRIPT",
                        "up_formatter_parameter": UPLINK_DECODER,
                        "down_formatter": "FORMATTER_NONE",
                        "down_formatter_parameter": "",
                    }
                }
            })))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let outcome = setup_application(&client(server.url()), "Test App", "my-org", &Config::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SetupOutcome {
                app_id: "test+app".to_string(),
                created: true,
            }
        );

        list.assert_async().await;
        create.assert_async().await;
        link.assert_async().await;
    }

    #[tokio::test]
    async fn test_setup_twice_creates_once() {
        let mut server = Server::new_async().await;
        let client = client(server.url());
        let config = Config::default();

        let empty_list = server
            .mock("GET", "/api/v3/applications")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let create = server
            .mock("POST", "/api/v3/users/my-org/applications")
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let link = server
            .mock("PUT", "/api/v3/as/applications/wb-letterboxsensor/link")
            .with_status(200)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;

        let first = setup_application(&client, "WB-LetterBoxSensor", "my-org", &config)
            .await
            .unwrap();
        assert!(first.created);

        empty_list.assert_async().await;
        empty_list.remove_async().await;

        let existing_list = server
            .mock("GET", "/api/v3/applications")
            .with_status(200)
            .with_body(r#"{"applications":[{"ids":{"application_id":"wb-letterboxsensor"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let second = setup_application(&client, "WB-LetterBoxSensor", "my-org", &config)
            .await
            .unwrap();
        assert!(!second.created);

        existing_list.assert_async().await;
        create.assert_async().await;
        link.assert_async().await;
    }

    #[tokio::test]
    async fn test_setup_aborts_when_listing_fails() {
        let mut server = Server::new_async().await;

        let list = server
            .mock("GET", "/api/v3/applications")
            .with_status(401)
            .with_body(r#"{"code":16,"message":"error:pkg/auth:unauthenticated"}"#)
            .expect(1)
            .create_async()
            .await;

        let create = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let link = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = setup_application(&client(server.url()), "Test App", "my-org", &Config::default())
            .await
            .unwrap_err();

        assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
        assert!(err.to_string().contains("unauthenticated"));

        list.assert_async().await;
        create.assert_async().await;
        link.assert_async().await;
    }

    #[tokio::test]
    async fn test_setup_reports_creation_failure_body() {
        let mut server = Server::new_async().await;

        let _list = server
            .mock("GET", "/api/v3/applications")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let _create = server
            .mock("POST", "/api/v3/users/my-org/applications")
            .with_status(409)
            .with_body(r#"{"code":6,"message":"error:pkg/identityserver/store:id_taken"}"#)
            .create_async()
            .await;

        let link = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = setup_application(&client(server.url()), "Test App", "my-org", &Config::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("id_taken"));
        link.assert_async().await;
    }
}
