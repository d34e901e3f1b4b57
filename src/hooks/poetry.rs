//! Poem list/detail/random/by-author hooks sharing one loading flag

use crate::api::models::{PageParams, PoemCollection, PoemQuery, Work};
use crate::api::PoetryApi;

use super::{Hook, HookError, HookState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoetryData {
    /// Poems of the last `fetch_poems` page
    pub poems: Vec<Work>,
    /// Poem loaded by `fetch_poem_by_id`
    pub current_poem: Option<Work>,
}

/// Poem hooks over a single [`Hook`]
///
/// All four fetches share one loading flag, one error and one generation, so
/// starting any of them supersedes whichever is still in flight: a detail
/// request overtaken by a random sample returns `HookError::Superseded` and
/// leaves `current_poem` alone. Use separate `PoetryHooks` for independent
/// concurrent loads.
pub struct PoetryHooks {
    api: PoetryApi,
    hook: Hook<PoetryData>,
}

impl PoetryHooks {
    pub fn new(api: PoetryApi) -> Self {
        Self {
            api,
            hook: Hook::new(),
        }
    }

    pub fn state(&self) -> HookState<PoetryData> {
        self.hook.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<HookState<PoetryData>> {
        self.hook.subscribe()
    }

    pub fn poems(&self) -> Vec<Work> {
        self.hook.snapshot().data.poems
    }

    pub fn current_poem(&self) -> Option<Work> {
        self.hook.snapshot().data.current_poem
    }

    pub fn loading(&self) -> bool {
        self.hook.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.hook.error()
    }

    /// Load one page of poems into `poems`
    pub async fn fetch_poems(&self, query: &PoemQuery) -> Result<PoemCollection, HookError> {
        self.hook
            .run("failed to load poems", self.api.poems(query), |data, page| {
                data.poems = page.works.clone();
            })
            .await
    }

    /// Load a poem into `current_poem`
    pub async fn fetch_poem_by_id(&self, id: &str) -> Result<Work, HookError> {
        self.hook
            .run("failed to load poem", self.api.poem(id), |data, poem| {
                data.current_poem = Some(poem.clone());
            })
            .await
    }

    /// Random sample; not stored
    pub async fn fetch_random_poems(&self, count: u32, category: &str) -> Result<Vec<Work>, HookError> {
        let random = self
            .hook
            .run(
                "failed to load random poems",
                self.api.random_poems(count, category),
                |_, _| {},
            )
            .await?;
        Ok(random.poems)
    }

    /// One page of an author's poems; not stored
    pub async fn fetch_poems_by_author(
        &self,
        author: &str,
        paging: &PageParams,
    ) -> Result<PoemCollection, HookError> {
        self.hook
            .run(
                "failed to load author poems",
                self.api.author_poems(author, paging),
                |_, _| {},
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::http::ApiClient;
    use crate::store::SessionStore;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn hooks() -> (MockServer, PoetryHooks) {
        let server = MockServer::start().await;
        let config = ApiConfig {
            base_url: server.uri(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(config, SessionStore::in_memory().shared()).unwrap();
        (server, PoetryHooks::new(PoetryApi::new(client)))
    }

    fn poem(id: u64, title: &str) -> serde_json::Value {
        json!({"id": id, "title": title, "content": ["床前明月光", "疑是地上霜"]})
    }

    #[tokio::test]
    async fn test_fetch_poems_stores_page() {
        let (server, hooks) = hooks().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems"))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"works": [poem(1, "静夜思")], "total": 6, "page": 2, "page_size": 5, "total_pages": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = PoemQuery {
            page: Some(2),
            page_size: Some(5),
            ..Default::default()
        };
        let page = hooks.fetch_poems(&query).await.unwrap();

        assert_eq!(page.total, 6);
        assert_eq!(hooks.poems().len(), 1);
        assert_eq!(hooks.poems()[0].title, "静夜思");
        assert!(!hooks.loading());
        assert!(hooks.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_poem_keeps_previous_and_sets_error() {
        let (server, hooks) = hooks().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": poem(1, "静夜思")})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/999"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
            .mount(&server)
            .await;

        hooks.fetch_poem_by_id("1").await.unwrap();
        let err = hooks.fetch_poem_by_id("999").await.unwrap_err();

        assert_eq!(err.message(), "failed to load poem");
        assert_eq!(hooks.error().as_deref(), Some("failed to load poem"));
        assert_eq!(hooks.current_poem().map(|p| p.id), Some(1));
    }

    #[tokio::test]
    async fn test_http_error_message_reaches_state() {
        let (server, hooks) = hooks().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/42"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"success": false, "error": "poem not found"})))
            .mount(&server)
            .await;

        let err = hooks.fetch_poem_by_id("42").await.unwrap_err();

        assert!(matches!(err, HookError::Api(_)));
        assert_eq!(hooks.error().as_deref(), Some("poem not found"));
    }

    #[tokio::test]
    async fn test_random_and_author_poems_are_not_stored() {
        let (server, hooks) = hooks().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/random"))
            .and(query_param("count", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "data": {"poems": [poem(3, "春晓"), poem(4, "登鹳雀楼")]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/authors/%E6%9D%8E%E7%99%BD/poems"))
            .and(query_param("page", "1"))
            .and(query_param("page_size", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "data": {"works": [poem(1, "静夜思")], "total": 1}
            })))
            .mount(&server)
            .await;

        let random = hooks.fetch_random_poems(2, "").await.unwrap();
        let by_author = hooks
            .fetch_poems_by_author("李白", &PageParams::new(1, 20))
            .await
            .unwrap();

        assert_eq!(random.len(), 2);
        assert_eq!(by_author.total, 1);
        assert!(hooks.poems().is_empty());
        assert!(hooks.current_poem().is_none());
    }

    #[tokio::test]
    async fn test_slow_detail_does_not_overwrite_newer_one() {
        let (server, hooks) = hooks().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": poem(1, "静夜思")}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": poem(2, "春晓")})))
            .mount(&server)
            .await;

        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            hooks.fetch_poem_by_id("2").await
        };
        let (first, second) = tokio::join!(hooks.fetch_poem_by_id("1"), second);

        assert!(matches!(first, Err(HookError::Superseded)));
        assert_eq!(second.unwrap().id, 2);
        assert_eq!(hooks.current_poem().map(|p| p.id), Some(2));
        assert!(!hooks.loading());
    }

    #[tokio::test]
    async fn test_any_fetch_supersedes_pending_detail() {
        let (server, hooks) = hooks().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": poem(1, "静夜思")}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "data": {"poems": [poem(3, "春晓")]}
            })))
            .mount(&server)
            .await;

        let random = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            hooks.fetch_random_poems(1, "").await
        };
        let (detail, random) = tokio::join!(hooks.fetch_poem_by_id("1"), random);

        assert!(matches!(detail, Err(HookError::Superseded)));
        assert_eq!(random.unwrap().len(), 1);
        assert!(hooks.current_poem().is_none());
        assert!(!hooks.loading());
    }
}
