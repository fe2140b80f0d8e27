//! Crowdin API v2 connector
//!
//! Every operation follows the same path: get a token from the
//! [`TokenValidator`] (no network when signed out), call the API with a
//! bearer header, and map the answer:
//!
//! | Response            | Result                                          |
//! |---------------------|-------------------------------------------------|
//! | 2xx                 | parsed payload                                  |
//! | 401                 | token forgotten, `RemoteAuthorizationExpired`   |
//! | other status        | `RemoteRequestFailed { status: Some(..) }`      |
//! | no response         | `RemoteRequestFailed { status: None }`          |

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_auth::{AccessToken, TokenStore, TokenValidator};
use core_runtime::events::{AuthEvent, EventBus};
use core_runtime::logging::{redact_if_sensitive, strip_path};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{CrowdinError, Result};
use crate::language::Language;
use crate::models::{ProjectInfo, ProjectListing, UserInfo};
use crate::types::{
    BranchResource, BuildFileRequest, DataEnvelope, DirectoryResource, DownloadLink,
    ErrorEnvelope, FileResource, ListEnvelope, ProjectResource, StorageResource,
    UploadTranslationRequest, UserResource,
};

/// Maximum page size accepted by list endpoints
pub const PAGE_LIMIT: usize = 500;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway to the Crowdin API for the signed-in user.
///
/// # Example
///
/// ```ignore
/// let api = CrowdinApi::new(http_client, token_store, DEFAULT_API_BASE_URL, event_bus);
/// for project in api.get_user_projects().await? {
///     println!("{} ({})", project.name, project.identifier);
/// }
/// ```
#[derive(Clone)]
pub struct CrowdinApi {
    http_client: Arc<dyn HttpClient>,
    validator: TokenValidator,
    token_store: Arc<TokenStore>,
    default_base_url: String,
    timeout: Duration,
    event_bus: EventBus,
}

impl CrowdinApi {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        token_store: Arc<TokenStore>,
        default_base_url: impl Into<String>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            http_client,
            validator: TokenValidator::new(token_store.clone()),
            token_store,
            default_base_url: default_base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            event_bus,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, token: &AccessToken, path: &str) -> String {
        format!("{}{}", token.api_base_url(&self.default_base_url), path)
    }

    fn request(&self, method: HttpMethod, token: &AccessToken, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.endpoint(token, path))
            .bearer_token(token.secret())
            .header("Accept", "application/json")
            .timeout(self.timeout)
    }

    /// Send an authenticated request and classify the response.
    async fn send(
        &self,
        operation: &str,
        token: &AccessToken,
        request: HttpRequest,
    ) -> Result<HttpResponse> {
        let response = match self.http_client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(operation, error = %e, "Crowdin request failed");
                return Err(CrowdinError::request_failed(operation, None, e.to_string()));
            }
        };

        if response.is_success() {
            debug!(operation, status = response.status, "Crowdin request succeeded");
            return Ok(response);
        }

        if response.is_unauthorized() {
            warn!(operation, "Crowdin rejected the access token");
            if self.token_store.clear_if_current(token).await {
                let _ = self.event_bus.emit(AuthEvent::SessionExpired {
                    operation: operation.to_string(),
                });
            }
            return Err(CrowdinError::RemoteAuthorizationExpired {
                operation: operation.to_string(),
            });
        }

        let message = response
            .json::<ErrorEnvelope>()
            .ok()
            .and_then(|envelope| envelope.message())
            .unwrap_or_else(|| format!("HTTP {}", response.status));
        warn!(operation, status = response.status, message = %message, "Crowdin request failed");

        Err(CrowdinError::request_failed(
            operation,
            Some(response.status),
            message,
        ))
    }

    fn parse<T: DeserializeOwned>(operation: &str, response: &HttpResponse) -> Result<T> {
        response
            .json::<T>()
            .map_err(|e| CrowdinError::parse(operation, e))
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        operation: &str,
        token: &AccessToken,
        path: &str,
    ) -> Result<T> {
        let request = self.request(HttpMethod::Get, token, path);
        let response = self.send(operation, token, request).await?;
        let envelope: DataEnvelope<T> = Self::parse(operation, &response)?;
        Ok(envelope.data)
    }

    async fn post_data<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &str,
        token: &AccessToken,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self
            .request(HttpMethod::Post, token, path)
            .json(body)
            .map_err(|e| CrowdinError::request_failed(operation, None, e.to_string()))?;
        let response = self.send(operation, token, request).await?;
        let envelope: DataEnvelope<T> = Self::parse(operation, &response)?;
        Ok(envelope.data)
    }

    /// Fetch every page of a list endpoint, in server order.
    async fn get_all<T: DeserializeOwned>(
        &self,
        operation: &str,
        token: &AccessToken,
        path: &str,
    ) -> Result<Vec<T>> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page_path = format!("{}{}limit={}&offset={}", path, separator, PAGE_LIMIT, offset);
            let request = self.request(HttpMethod::Get, token, &page_path);
            let response = self.send(operation, token, request).await?;
            let page: ListEnvelope<T> = Self::parse(operation, &response)?;

            let page = page.into_items();
            let count = page.len();
            items.extend(page);

            if count < PAGE_LIMIT {
                break;
            }
            offset += count;
        }

        Ok(items)
    }

    /// Details of the signed-in user.
    #[instrument(skip(self))]
    pub async fn get_user_info(&self) -> Result<UserInfo> {
        let token = self.validator.get_valid_token().await?;
        let user: UserResource = self.get_data("fetch user info", &token, "user").await?;
        // Some logins are email addresses
        debug!(login = %redact_if_sensitive("login", &user.username), "Fetched Crowdin user");
        Ok(user.into())
    }

    /// All projects the user can access.
    #[instrument(skip(self))]
    pub async fn get_user_projects(&self) -> Result<Vec<ProjectListing>> {
        let token = self.validator.get_valid_token().await?;
        let projects: Vec<ProjectResource> =
            self.get_all("fetch projects", &token, "projects").await?;

        info!(count = projects.len(), "Fetched Crowdin projects");
        Ok(projects.into_iter().map(ProjectListing::from).collect())
    }

    /// Project name, target languages and files with resolved paths.
    #[instrument(skip(self))]
    pub async fn get_project_info(&self, project_id: u64) -> Result<ProjectInfo> {
        const OPERATION: &str = "fetch project info";
        let token = self.validator.get_valid_token().await?;

        let project_path = format!("projects/{}", project_id);
        let files_path = format!("projects/{}/files", project_id);
        let directories_path = format!("projects/{}/directories", project_id);
        let branches_path = format!("projects/{}/branches", project_id);

        let (project, files, directories, branches) = futures::try_join!(
            self.get_data::<ProjectResource>(OPERATION, &token, &project_path),
            self.get_all::<FileResource>(OPERATION, &token, &files_path),
            self.get_all::<DirectoryResource>(OPERATION, &token, &directories_path),
            self.get_all::<BranchResource>(OPERATION, &token, &branches_path),
        )?;

        debug!(
            files = files.len(),
            directories = directories.len(),
            branches = branches.len(),
            "Fetched Crowdin project tree"
        );

        Ok(ProjectInfo::assemble(project, files, directories, branches))
    }

    /// Download the translation of one file into `output`.
    ///
    /// The export format is chosen remotely: `force_export_as_xliff` (or an
    /// `xliff`/`xlf` extension) asks Crowdin for XLIFF instead of the file's
    /// native format. The content is streamed into a sibling `.part` file and
    /// moved onto `output` only once complete.
    #[instrument(skip(self, lang, output), fields(lang = %lang))]
    pub async fn download_file(
        &self,
        project_id: u64,
        lang: &Language,
        file_id: u64,
        file_extension: &str,
        force_export_as_xliff: bool,
        output: &Path,
    ) -> Result<()> {
        const OPERATION: &str = "download file";
        let token = self.validator.get_valid_token().await?;

        let export_as_xliff = force_export_as_xliff
            || matches!(
                file_extension.trim_start_matches('.').to_ascii_lowercase().as_str(),
                "xliff" | "xlf"
            );
        let body = BuildFileRequest {
            target_language_id: lang.crowdin_id(),
            export_as_xliff,
        };
        let path = format!(
            "projects/{}/translations/builds/files/{}",
            project_id, file_id
        );
        let link: DownloadLink = self.post_data(OPERATION, &token, &path, &body).await?;

        let mut reader = self
            .http_client
            .download_stream(link.url)
            .await
            .map_err(|e| CrowdinError::request_failed(OPERATION, None, e.to_string()))?;

        let partial = partial_path(output);
        let output_name = output.to_string_lossy();
        let file_name = strip_path(&output_name);
        let written = async {
            let mut file = tokio::fs::File::create(&partial).await?;
            let bytes = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&partial, output).await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;

        match written {
            Ok(bytes) => {
                info!(bytes, file_id, file_name, "Downloaded Crowdin translation");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, file_name, "Failed to write downloaded translation");
                let _ = tokio::fs::remove_file(&partial).await;
                Err(CrowdinError::Io(e))
            }
        }
    }

    /// Upload translated content for one file.
    ///
    /// The bytes go to Crowdin storage first, then get imported as
    /// suggestions (identical strings included, nothing auto-approved).
    #[instrument(skip(self, lang, content), fields(lang = %lang, size = content.len()))]
    pub async fn upload_file(
        &self,
        project_id: u64,
        lang: &Language,
        file_id: u64,
        file_extension: &str,
        content: Bytes,
    ) -> Result<()> {
        const OPERATION: &str = "upload file";
        let token = self.validator.get_valid_token().await?;

        let file_name = format!("crowdin.{}", file_extension.trim_start_matches('.'));
        let request = self
            .request(HttpMethod::Post, &token, "storages")
            .header("Crowdin-API-FileName", urlencoding::encode(&file_name))
            .header("Content-Type", "application/octet-stream")
            .body(content);
        let response = self.send(OPERATION, &token, request).await?;
        let storage: DataEnvelope<StorageResource> = Self::parse(OPERATION, &response)?;

        debug!(storage_id = storage.data.id, "Uploaded translation to Crowdin storage");

        let body = UploadTranslationRequest {
            storage_id: storage.data.id,
            file_id,
            import_eq_suggestions: true,
            auto_approve_imported: false,
        };
        let path = format!(
            "projects/{}/translations/{}",
            project_id,
            urlencoding::encode(lang.crowdin_id())
        );
        let request = self
            .request(HttpMethod::Post, &token, &path)
            .json(&body)
            .map_err(|e| CrowdinError::request_failed(OPERATION, None, e.to_string()))?;
        self.send(OPERATION, &token, request).await?;

        info!(file_id, "Uploaded Crowdin translation");
        Ok(())
    }
}

impl std::fmt::Debug for CrowdinApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdinApi")
            .field("default_base_url", &self.default_base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::storage::SecureStore;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn download_stream(&self, url: String) -> BridgeResult<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        data: tokio::sync::Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.data.lock().await.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }
    }

    const BASE: &str = "https://api.crowdin.com/api/v2/";

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    async fn api_with(mock_http: MockHttpClient, token: Option<&str>) -> (CrowdinApi, Arc<TokenStore>) {
        let token_store = Arc::new(TokenStore::new(Arc::new(MemoryStore::default())));
        if let Some(token) = token {
            token_store.save(AccessToken::new(token)).await;
        }
        let api = CrowdinApi::new(
            Arc::new(mock_http),
            token_store.clone(),
            BASE,
            EventBus::new(8),
        );
        (api, token_store)
    }

    fn project_page(start: u64, count: u64) -> String {
        let items: Vec<String> = (start..start + count)
            .map(|id| {
                format!(
                    r#"{{"data":{{"id":{},"identifier":"p{}","name":"Project {}"}}}}"#,
                    id, id, id
                )
            })
            .collect();
        format!(r#"{{"data":[{}],"pagination":{{"offset":0,"limit":500}}}}"#, items.join(","))
    }

    #[tokio::test]
    async fn test_signed_out_fails_without_network() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(0);

        let (api, _) = api_with(mock_http, None).await;

        assert!(matches!(
            api.get_user_info().await,
            Err(CrowdinError::SignInRequired)
        ));
        assert!(matches!(
            api.get_user_projects().await,
            Err(CrowdinError::SignInRequired)
        ));
    }

    #[tokio::test]
    async fn test_get_user_info() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Get);
            assert_eq!(req.url, "https://api.crowdin.com/api/v2/user");
            assert_eq!(
                req.headers.get("Authorization").map(String::as_str),
                Some("Bearer tok")
            );
            Ok(json_response(
                200,
                r#"{"data":{"id":1,"username":"jdoe","fullName":"Jo Doe","avatarUrl":"https://x/a.png"}}"#,
            ))
        });

        let (api, _) = api_with(mock_http, Some("tok")).await;
        let user = api.get_user_info().await.unwrap();

        assert_eq!(user.name, "Jo Doe");
        assert_eq!(user.login, "jdoe");
        assert_eq!(user.avatar.as_deref(), Some("https://x/a.png"));
    }

    #[tokio::test]
    async fn test_email_login_is_returned_unredacted() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                200,
                r#"{"data":{"id":2,"username":"jo@example.com","fullName":null}}"#,
            ))
        });

        let (api, _) = api_with(mock_http, Some("tok")).await;
        let user = api.get_user_info().await.unwrap();

        assert_eq!(user.login, "jo@example.com");
        assert_eq!(user.name, "jo@example.com");
    }

    #[tokio::test]
    async fn test_projects_are_paginated() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("projects?limit=500&offset=0"))
            .times(1)
            .returning(|_| Ok(json_response(200, &project_page(0, 500))));
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("projects?limit=500&offset=500"))
            .times(1)
            .returning(|_| Ok(json_response(200, &project_page(500, 3))));

        let (api, _) = api_with(mock_http, Some("tok")).await;
        let projects = api.get_user_projects().await.unwrap();

        assert_eq!(projects.len(), 503);
        assert_eq!(projects[0].id, 0);
        assert_eq!(projects[502].identifier, "p502");
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                401,
                r#"{"error":{"code":401,"message":"Unauthorized"}}"#,
            ))
        });

        let (api, token_store) = api_with(mock_http, Some("tok")).await;
        let mut events = api.event_bus.subscribe();

        let result = api.get_user_projects().await;

        assert!(matches!(
            result,
            Err(CrowdinError::RemoteAuthorizationExpired { ref operation }) if operation == "fetch projects"
        ));
        assert_eq!(token_store.cached(), None);
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SessionExpired {
                operation: "fetch projects".to_string()
            }
        );

        // Next call fails fast
        assert!(matches!(
            api.get_user_info().await,
            Err(CrowdinError::SignInRequired)
        ));
    }

    #[tokio::test]
    async fn test_server_error_keeps_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                503,
                r#"{"error":{"code":503,"message":"Service Unavailable"}}"#,
            ))
        });

        let (api, token_store) = api_with(mock_http, Some("tok")).await;
        let result = api.get_user_info().await;

        match result {
            Err(CrowdinError::RemoteRequestFailed {
                operation,
                status,
                message,
            }) => {
                assert_eq!(operation, "fetch user info");
                assert_eq!(status, Some(503));
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(token_store.cached().is_some());
    }

    #[tokio::test]
    async fn test_transport_error_has_no_status() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("dns failure".to_string())));

        let (api, _) = api_with(mock_http, Some("tok")).await;

        assert!(matches!(
            api.get_user_info().await,
            Err(CrowdinError::RemoteRequestFailed { status: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_unparseable_payload() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, "<html>")));

        let (api, _) = api_with(mock_http, Some("tok")).await;

        assert!(matches!(
            api.get_user_info().await,
            Err(CrowdinError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_upload_file() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("/storages"))
            .times(1)
            .returning(|req| {
                assert_eq!(
                    req.headers.get("Crowdin-API-FileName").map(String::as_str),
                    Some("crowdin.po")
                );
                assert_eq!(req.body.as_deref(), Some(&b"msgid \"\""[..]));
                Ok(json_response(201, r#"{"data":{"id":77,"fileName":"crowdin.po"}}"#))
            });
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("projects/5/translations/pt-BR"))
            .times(1)
            .returning(|req| {
                let body: serde_json::Value =
                    serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
                assert_eq!(body["storageId"], 77);
                assert_eq!(body["fileId"], 9);
                assert_eq!(body["importEqSuggestions"], true);
                assert_eq!(body["autoApproveImported"], false);
                Ok(json_response(200, r#"{"data":{"projectId":5}}"#))
            });

        let (api, _) = api_with(mock_http, Some("tok")).await;
        let lang: Language = "pt-BR".parse().unwrap();

        api.upload_file(5, &lang, 9, "po", Bytes::from_static(b"msgid \"\""))
            .await
            .unwrap();
    }

    const UNAUTHORIZED: &str = r#"{"error":{"code":401,"message":"Unauthorized"}}"#;

    fn assert_expired<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
        match result {
            Err(CrowdinError::RemoteAuthorizationExpired { operation }) => {
                assert_eq!(operation, expected)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_build_request_clears_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("projects/3/translations/builds/files/8"))
            .times(1)
            .returning(|_| Ok(json_response(401, UNAUTHORIZED)));
        mock_http.expect_download_stream().times(0);

        let (api, token_store) = api_with(mock_http, Some("tok")).await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("fr.po");
        let lang: Language = "fr".parse().unwrap();

        assert_expired(
            api.download_file(3, &lang, 8, "po", false, &output).await,
            "download file",
        );
        assert_eq!(token_store.cached(), None);
        assert!(!output.exists());
        assert!(matches!(
            api.get_user_info().await,
            Err(CrowdinError::SignInRequired)
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_storage_upload_clears_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("/storages"))
            .times(1)
            .returning(|_| Ok(json_response(401, UNAUTHORIZED)));
        mock_http
            .expect_execute()
            .withf(|req| req.url.contains("/translations/"))
            .times(0);

        let (api, token_store) = api_with(mock_http, Some("tok")).await;
        let lang: Language = "de".parse().unwrap();

        assert_expired(
            api.upload_file(5, &lang, 9, "po", Bytes::from_static(b"x")).await,
            "upload file",
        );
        assert_eq!(token_store.cached(), None);
    }

    #[tokio::test]
    async fn test_unauthorized_import_clears_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("/storages"))
            .times(1)
            .returning(|_| Ok(json_response(201, r#"{"data":{"id":77,"fileName":"crowdin.po"}}"#)));
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("projects/5/translations/de"))
            .times(1)
            .returning(|_| Ok(json_response(401, UNAUTHORIZED)));

        let (api, token_store) = api_with(mock_http, Some("tok")).await;
        let lang: Language = "de".parse().unwrap();

        assert_expired(
            api.upload_file(5, &lang, 9, "po", Bytes::from_static(b"x")).await,
            "upload file",
        );
        assert_eq!(token_store.cached(), None);
        assert!(matches!(
            api.get_user_info().await,
            Err(CrowdinError::SignInRequired)
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_project_sub_request_clears_token() {
        let empty_page = r#"{"data":[],"pagination":{"offset":0,"limit":500}}"#;

        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("projects/4"))
            .times(0..=1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{"data":{"id":4,"identifier":"p4","name":"Project 4"}}"#,
                ))
            });
        mock_http
            .expect_execute()
            .withf(|req| req.url.contains("projects/4/files") || req.url.contains("projects/4/directories"))
            .times(0..=2)
            .returning(move |_| Ok(json_response(200, empty_page)));
        mock_http
            .expect_execute()
            .withf(|req| req.url.contains("projects/4/branches"))
            .times(1)
            .returning(|_| Ok(json_response(401, UNAUTHORIZED)));

        let (api, token_store) = api_with(mock_http, Some("tok")).await;
        let mut events = api.event_bus.subscribe();

        assert_expired(api.get_project_info(4).await, "fetch project info");
        assert_eq!(token_store.cached(), None);
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SessionExpired {
                operation: "fetch project info".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_enterprise_token_uses_organization_host() {
        use base64::Engine as _;

        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(br#"{"domain":"acme"}"#);
        let token = format!("e30.{}.sig", payload);

        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "https://acme.api.crowdin.com/api/v2/user");
            Ok(json_response(200, r#"{"data":{"username":"jdoe"}}"#))
        });

        let (api, _) = api_with(mock_http, Some(&token)).await;
        api.get_user_info().await.unwrap();
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("/tmp/fr.po")),
            PathBuf::from("/tmp/fr.po.part")
        );
    }
}
