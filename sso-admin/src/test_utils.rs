use crate::config::AdminConfig;
use crate::create_app;
use crate::services::profile;
use crate::state::tests::create_test_state;
use crate::state::AppState;
use crate::store::seed::{seed, ADMIN_USER};
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Test fixture for driving the complete router over a seeded in-memory store.
///
/// The store holds the seeded `Admin`/`Member` roles, the `SSO_SERVER` api
/// resource and the `admin` user, for whom an access token is issued up front.
/// Uploads land in a temporary directory that lives as long as the fixture.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.get("/roles/filter").await;
///
///     response.assert_ok();
///     let page = response.json_as::<Page<RoleView>>();
///     assert_eq!(page.total_records, 2);
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration the router was built with
    pub config: AdminConfig,
    /// Shared state, for arranging data directly in the store
    pub state: AppState,
    /// Access token of the seeded admin user
    pub admin_token: String,
    _files_root: TempDir,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let files_root = tempfile::tempdir().expect("Failed to create files root");
        let config = AdminConfig::for_test(files_root.path());
        let state = create_test_state(&config);
        seed(state.store.as_ref())
            .await
            .expect("Failed to seed store")
            .expect("Store was not empty");
        let app = create_app(state.clone()).await;

        let mut fixture = Self {
            app,
            config,
            state,
            admin_token: String::new(),
            _files_root: files_root,
        };
        fixture.admin_token = fixture.token_for(ADMIN_USER).await;
        fixture
    }

    /// Initializes the test logger; repeated calls are no-ops
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Issues an access token for `subject` with freshly computed claims
    pub async fn token_for(&self, subject: &str) -> String {
        let (user, claims) = profile::issue_claims(
            self.state.store.as_ref(),
            subject,
            &self.config.default_avatar,
        )
        .await
        .expect("Failed to compute claims");
        let (token, _) = self
            .state
            .tokens
            .issue(&user.id, claims)
            .await
            .expect("Failed to issue token");
        token
    }

    /// Creates a request builder carrying `credential` as a bearer credential, if any
    pub fn request_builder_with(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        credential: Option<&str>,
    ) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());
        if let Some(credential) = credential {
            builder = builder.header("Authorization", format!("Bearer {credential}"));
        }
        builder
    }

    /// Creates a JSON request builder authenticated as the seeded admin
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        self.request_builder_with(method, uri, Some(&self.admin_token))
            .header("Content-Type", "application/json")
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn get_anonymous(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder_with(Method::GET, uri, None)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.send_json(Method::POST, uri, body).await
    }

    pub async fn put<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        self.send_json(Method::PUT, uri, body).await
    }

    pub async fn delete(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = self
            .request_builder(Method::DELETE, uri)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        body: &T,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(method, uri)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a JSON request with an explicit bearer credential, e.g. the API key or another user's token
    pub async fn send_as<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        credential: &str,
        body: Option<&T>,
    ) -> TestResponse {
        let builder = self
            .request_builder_with(method, uri, Some(credential))
            .header("Content-Type", "application/json");
        let body = match body {
            Some(body) => {
                Body::from(serde_json::to_vec(body).expect("Failed to serialize body to JSON"))
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("Failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub json: Value,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }

    /// The `detail` message of an error body
    pub fn detail(&self) -> &str {
        self.json["detail"].as_str().unwrap_or_default()
    }
}
