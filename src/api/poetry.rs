//! Content API (v1): poems, authors, catalog and search
//!
//! Thin mapping from method to endpoint. Parameters are forwarded as given
//! and the decoded envelope is returned untouched.

use crate::http::{ApiClient, ApiError, ApiVersion};

use super::envelope::Envelope;
use super::models::{
    Author, AuthorCollection, AuthorQuery, Category, Dynasty, PageParams, PoemCollection,
    PoemQuery, RandomPoems, SearchResults, Work,
};

/// Query for `GET /poems/random`
#[derive(Debug, serde::Serialize)]
struct RandomQuery<'a> {
    count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

/// Query for `GET /search`
#[derive(Debug, serde::Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<u32>,
}

#[derive(Clone)]
pub struct PoetryApi {
    client: ApiClient,
}

impl PoetryApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// `GET /poems` - one page, optionally filtered by category
    pub async fn poems(&self, query: &PoemQuery) -> Result<Envelope<PoemCollection>, ApiError> {
        self.client.get(ApiVersion::V1, &["poems"], query).await
    }

    /// `GET /poems/:id`
    pub async fn poem(&self, id: &str) -> Result<Envelope<Work>, ApiError> {
        self.client.get(ApiVersion::V1, &["poems", id], &()).await
    }

    /// `GET /poems/random` - `count` poems, optionally from one category
    pub async fn random_poems(&self, count: u32, category: &str) -> Result<Envelope<RandomPoems>, ApiError> {
        let query = RandomQuery {
            count,
            category: Some(category).filter(|c| !c.is_empty()),
        };
        self.client.get(ApiVersion::V1, &["poems", "random"], &query).await
    }

    /// `GET /search?q=`
    pub async fn search(&self, q: &str, paging: &PageParams) -> Result<Envelope<SearchResults>, ApiError> {
        let query = SearchQuery {
            q,
            page: paging.page,
            page_size: paging.page_size,
        };
        self.client.get(ApiVersion::V1, &["search"], &query).await
    }

    /// `GET /dynasties`
    pub async fn dynasties(&self) -> Result<Envelope<Vec<Dynasty>>, ApiError> {
        self.client.get(ApiVersion::V1, &["dynasties"], &()).await
    }

    /// `GET /categories`
    pub async fn categories(&self) -> Result<Envelope<Vec<Category>>, ApiError> {
        self.client.get(ApiVersion::V1, &["categories"], &()).await
    }

    /// `GET /authors` - one page, optionally filtered by dynasty
    pub async fn authors(&self, query: &AuthorQuery) -> Result<Envelope<AuthorCollection>, ApiError> {
        self.client.get(ApiVersion::V1, &["authors"], query).await
    }

    /// `GET /authors/:name`
    pub async fn author(&self, name: &str) -> Result<Envelope<Author>, ApiError> {
        self.client.get(ApiVersion::V1, &["authors", name], &()).await
    }

    /// `GET /authors/:name/poems`
    pub async fn author_poems(&self, name: &str, paging: &PageParams) -> Result<Envelope<PoemCollection>, ApiError> {
        self.client
            .get(ApiVersion::V1, &["authors", name, "poems"], paging)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::store::SessionStore;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api() -> (MockServer, PoetryApi) {
        let server = MockServer::start().await;
        let config = ApiConfig {
            base_url: server.uri(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(config, SessionStore::in_memory().shared()).unwrap();
        (server, PoetryApi::new(client))
    }

    fn ok(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": data}))
    }

    #[tokio::test]
    async fn test_poems_forwards_paging_and_category() {
        let (server, api) = api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems"))
            .and(query_param("page", "3"))
            .and(query_param("page_size", "7"))
            .and(query_param("category", "songci"))
            .respond_with(ok(json!({"works": [{"id": 1}], "total": 1, "page": 3, "page_size": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let query = PoemQuery {
            page: Some(3),
            page_size: Some(7),
            category: Some("songci".to_string()),
        };
        let page = api.poems(&query).await.unwrap().into_result("x").unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 7);
    }

    #[tokio::test]
    async fn test_random_omits_empty_category() {
        let (server, api) = api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/poems/random"))
            .and(query_param("count", "2"))
            .and(query_param_is_missing("category"))
            .respond_with(ok(json!({"poems": [{"id": 1}, {"id": 2}]})))
            .expect(1)
            .mount(&server)
            .await;

        let random = api.random_poems(2, "").await.unwrap().into_result("x").unwrap();
        assert_eq!(random.poems.len(), 2);
    }

    #[tokio::test]
    async fn test_search_sends_q_and_paging() {
        let (server, api) = api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("q", "明月"))
            .and(query_param("page", "1"))
            .and(query_param("page_size", "20"))
            .respond_with(ok(json!({"works": [], "total": 0, "query": "明月"})))
            .expect(1)
            .mount(&server)
            .await;

        let results = api
            .search("明月", &PageParams::new(1, 20))
            .await
            .unwrap()
            .into_result("x")
            .unwrap();
        assert_eq!(results.query, "明月");
    }

    #[tokio::test]
    async fn test_author_poems_path() {
        let (server, api) = api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/authors/%E6%9D%9C%E7%94%AB/poems"))
            .and(query_param("page", "2"))
            .respond_with(ok(json!({"works": [{"id": 9, "title": "春望"}], "total": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let paging = PageParams {
            page: Some(2),
            page_size: None,
        };
        let page = api
            .author_poems("杜甫", &paging)
            .await
            .unwrap()
            .into_result("x")
            .unwrap();
        assert_eq!(page.works[0].title, "春望");
    }

    #[tokio::test]
    async fn test_catalog_endpoints() {
        let (server, api) = api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/dynasties"))
            .respond_with(ok(json!([{"id": "tang", "name": "唐", "sort_order": 3}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/categories"))
            .respond_with(ok(json!([{"id": 1, "name": "quantangshi"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/authors"))
            .and(query_param("dynasty", "song"))
            .respond_with(ok(json!({"authors": [{"name": "苏轼"}], "total": 1})))
            .mount(&server)
            .await;

        let dynasties = api.dynasties().await.unwrap().into_result("x").unwrap();
        assert_eq!(dynasties[0].sort_order, 3);

        let categories = api.categories().await.unwrap().into_result("x").unwrap();
        assert_eq!(categories[0].name, "quantangshi");

        let query = AuthorQuery {
            dynasty: Some("song".to_string()),
            ..Default::default()
        };
        let authors = api.authors(&query).await.unwrap().into_result("x").unwrap();
        assert_eq!(authors.authors[0].name, "苏轼");
    }

    #[tokio::test]
    async fn test_failure_envelope_is_returned_not_raised() {
        let (server, api) = api().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/authors/nobody"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "no such author"})),
            )
            .mount(&server)
            .await;

        let envelope = api.author("nobody").await.unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.into_result("x"), Err("no such author".to_string()));
    }
}
