//! Conditional API fixtures
//!
//! An [`ApiFixture`] wraps a callback that builds a client for a local,
//! in-process test server. When the fixture's environment variable
//! (`MIIA_HOST` by default) holds a host, the fixture hands out a client for
//! that host instead and never runs the callback. The same test suite can
//! then run against a local server during development and against a deployed
//! host in CI/CD.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use miia_shared_config::{
    remote_host_from_env, resolve_remote_host, HttpTimeouts, DEFAULT_HOST_ENV_VAR,
};
use reqwest::Url;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::client::{ApiClient, ApiRequest, HttpClient};
use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;

/// How long a resolved client is shared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixtureScope {
    /// Resolve a fresh client on every request for the fixture
    #[default]
    Function,
    /// Resolve once and hand out the same client afterwards.
    ///
    /// The cached client is bound to the runtime that created it, so session
    /// fixtures belong to suites that share one runtime.
    Session,
}

/// Configuration of an [`ApiFixture`]
#[derive(Debug, Clone)]
pub struct FixtureOptions {
    env_var: String,
    name: Option<String>,
    scope: FixtureScope,
    timeouts: Option<HttpTimeouts>,
}

impl FixtureOptions {
    /// Environment variable naming the remote host
    pub fn env_var(mut self, env_var: impl Into<String>) -> Self {
        self.env_var = env_var.into();
        self
    }

    /// Fixture name used in logs and errors
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the name unless one was given already
    pub fn name_or(mut self, name: impl Into<String>) -> Self {
        if self.name.is_none() {
            self.name = Some(name.into());
        }
        self
    }

    pub fn scope(mut self, scope: FixtureScope) -> Self {
        self.scope = scope;
        self
    }

    /// Timeouts for remote host clients.
    ///
    /// Without them, remote clients read `MIIA_CONNECT_TIMEOUT_SECS` and
    /// `MIIA_READ_TIMEOUT_SECS`, defaulting to 5 s and 10 s.
    pub fn timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    pub fn env_var_name(&self) -> &str {
        &self.env_var
    }

    pub fn scope_kind(&self) -> FixtureScope {
        self.scope
    }

    pub fn http_timeouts(&self) -> Option<HttpTimeouts> {
        self.timeouts
    }
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            env_var: DEFAULT_HOST_ENV_VAR.to_string(),
            name: None,
            scope: FixtureScope::default(),
            timeouts: None,
        }
    }
}

/// The client handed out by a fixture: either the remote host client or
/// whatever the local build callback produced
#[derive(Debug)]
pub enum FixtureClient<C> {
    Remote(HttpClient),
    Local(C),
}

impl<C> FixtureClient<C> {
    pub fn is_remote(&self) -> bool {
        matches!(self, FixtureClient::Remote(_))
    }

    pub fn as_local(&self) -> Option<&C> {
        match self {
            FixtureClient::Local(client) => Some(client),
            FixtureClient::Remote(_) => None,
        }
    }

    pub fn into_local(self) -> Option<C> {
        match self {
            FixtureClient::Local(client) => Some(client),
            FixtureClient::Remote(_) => None,
        }
    }
}

#[async_trait]
impl<C: ApiClient> ApiClient for FixtureClient<C> {
    fn base_url(&self) -> &Url {
        match self {
            FixtureClient::Remote(client) => client.base_url(),
            FixtureClient::Local(client) => client.base_url(),
        }
    }

    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        match self {
            FixtureClient::Remote(client) => client.send(request).await,
            FixtureClient::Local(client) => client.send(request).await,
        }
    }
}

type BuildFn<C> = Box<dyn Fn() -> BoxFuture<'static, ApiResult<C>> + Send + Sync>;

/// A test API fixture that can be redirected to a remote host
///
/// # Example
///
/// ```rust,ignore
/// use miia_test_utils::{ApiFixture, FixtureOptions, MockApiServer};
///
/// async fn testserver_api() -> ApiResult<MockApiServer> {
///     let server = MockApiServer::start().await?;
///     server.mock_json(Method::GET, "/", 200, json!({"msg": "Loren ipsum"})).await;
///     Ok(server)
/// }
///
/// let fixture = ApiFixture::new(testserver_api);
/// let api = fixture.resolve().await?;
/// ```
pub struct ApiFixture<C> {
    name: String,
    options: FixtureOptions,
    build: BuildFn<C>,
    session: OnceCell<Arc<FixtureClient<C>>>,
}

impl<C: ApiClient + 'static> ApiFixture<C> {
    /// Fixture with default options
    pub fn new<F, Fut>(build: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<C>> + Send + 'static,
    {
        Self::with_options(build, FixtureOptions::default())
    }

    /// Fixture with explicit options
    ///
    /// Without an explicit name, the fixture is named after `build`.
    pub fn with_options<F, Fut>(build: F, options: FixtureOptions) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<C>> + Send + 'static,
    {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| callback_name(std::any::type_name::<F>()));

        Self {
            name,
            options,
            build: Box::new(move || Box::pin(build())),
            session: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &FixtureOptions {
        &self.options
    }

    /// Resolve the fixture using the process environment
    pub async fn resolve(&self) -> ApiResult<FixtureClient<C>> {
        let host = remote_host_from_env(&self.options.env_var)?;
        self.resolve_target(host).await
    }

    /// Resolve the fixture against an explicit host value.
    ///
    /// A non-blank `host` selects the remote client and the build callback is
    /// not invoked; otherwise the callback's client is returned as is.
    pub async fn resolve_with_host(&self, host: Option<&str>) -> ApiResult<FixtureClient<C>> {
        let host = resolve_remote_host(&self.options.env_var, host)?;
        self.resolve_target(host).await
    }

    async fn resolve_target(&self, host: Option<Url>) -> ApiResult<FixtureClient<C>> {
        if let Some(url) = host {
            let timeouts = match self.options.timeouts {
                Some(timeouts) => timeouts,
                None => HttpTimeouts::from_env()?,
            };
            info!(
                fixture = %self.name,
                env_var = %self.options.env_var,
                host = %url,
                "Using remote API host"
            );
            let client = HttpClient::with_timeouts(url, timeouts)?;
            return Ok(FixtureClient::Remote(client));
        }

        debug!(fixture = %self.name, "Building local API client");
        let client = (self.build)()
            .await
            .map_err(|e| ApiError::fixture_build(&self.name, e))?;

        Ok(FixtureClient::Local(client))
    }

    /// Resolve the fixture according to its scope
    pub async fn get(&self) -> ApiResult<Arc<FixtureClient<C>>> {
        match self.options.scope {
            FixtureScope::Function => Ok(Arc::new(self.resolve().await?)),
            FixtureScope::Session => self
                .session
                .get_or_try_init(|| async { self.resolve().await.map(Arc::new) })
                .await
                .cloned(),
        }
    }
}

impl<C> fmt::Debug for ApiFixture<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiFixture")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("resolved", &self.session.initialized())
            .finish()
    }
}

/// Last path segment of a function's type name, skipping closure markers
fn callback_name(type_name: &str) -> String {
    let path = type_name.split('<').next().unwrap_or(type_name);
    path.split("::")
        .filter(|segment| !segment.is_empty() && !segment.starts_with("{{"))
        .last()
        .unwrap_or(path)
        .to_string()
}

/// Declare a zero-argument async fixture function backed by an [`ApiFixture`].
///
/// The fixture is named after the declared function and lives in a static,
/// so session scope is shared by every caller.
///
/// ```rust,ignore
/// api_fixture!(pub testserver_api: MockApiServer = start_testserver);
/// api_fixture!(
///     staging_api: MockApiServer = start_testserver,
///     FixtureOptions::default().env_var("STAGING_HOST")
/// );
///
/// let api = testserver_api().await?;
/// ```
#[macro_export]
macro_rules! api_fixture {
    ($vis:vis $name:ident : $client:ty = $build:expr) => {
        $crate::api_fixture!($vis $name: $client = $build, $crate::FixtureOptions::default());
    };
    ($vis:vis $name:ident : $client:ty = $build:expr, $options:expr) => {
        $vis async fn $name() -> $crate::ApiResult<::std::sync::Arc<$crate::FixtureClient<$client>>> {
            static FIXTURE: ::std::sync::OnceLock<$crate::ApiFixture<$client>> =
                ::std::sync::OnceLock::new();

            FIXTURE
                .get_or_init(|| {
                    $crate::ApiFixture::with_options($build, $options.name_or(stringify!($name)))
                })
                .get()
                .await
        }
    };
}
