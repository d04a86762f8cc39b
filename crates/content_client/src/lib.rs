//! HTTP client for the public content API with an in-memory TTL cache.
//!
//! Lists (`/api/blogs`, `/api/courses`, ...) and detail lookups are cached
//! separately: lists change more often, so they get the shorter TTL.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use api_types::{
    ErrorBody,
    content::{BlogView, CourseView, LessonView},
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

pub const DEFAULT_LIST_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_DETAIL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("content server error: {0}")]
    Server(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CacheClass {
    List,
    Detail,
}

#[derive(Debug)]
struct CacheEntry {
    expires_at: Instant,
    body: Value,
}

#[derive(Debug)]
pub struct ContentClient {
    client: Client,
    base_url: String,
    list_ttl: Duration,
    detail_ttl: Duration,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

/// The builder for `ContentClient`
#[derive(Debug)]
pub struct ContentClientBuilder {
    client: Option<Client>,
    base_url: String,
    list_ttl: Duration,
    detail_ttl: Duration,
}

impl ContentClientBuilder {
    /// Reuse an existing HTTP client (connection pool).
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn list_ttl(mut self, ttl: Duration) -> Self {
        self.list_ttl = ttl;
        self
    }

    pub fn detail_ttl(mut self, ttl: Duration) -> Self {
        self.detail_ttl = ttl;
        self
    }

    pub fn build(self) -> ContentClient {
        ContentClient {
            client: self.client.unwrap_or_default(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            list_ttl: self.list_ttl,
            detail_ttl: self.detail_ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl ContentClient {
    pub fn builder(base_url: impl Into<String>) -> ContentClientBuilder {
        ContentClientBuilder {
            client: None,
            base_url: base_url.into(),
            list_ttl: DEFAULT_LIST_TTL,
            detail_ttl: DEFAULT_DETAIL_TTL,
        }
    }

    fn ttl(&self, class: CacheClass) -> Duration {
        match class {
            CacheClass::List => self.list_ttl,
            CacheClass::Detail => self.detail_ttl,
        }
    }

    /// Fresh cached body for `key`. An expired entry is removed.
    async fn cached(&self, key: &str) -> Option<Value> {
        {
            let cache = self.cache.read().await;
            let entry = cache.get(key)?;
            if entry.expires_at > Instant::now() {
                return Some(entry.body.clone());
            }
        }

        let mut cache = self.cache.write().await;
        if cache
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            cache.remove(key);
        }
        None
    }

    /// Stores `body` for `ttl`, dropping every entry that has already expired.
    async fn store(&self, key: String, body: Value, ttl: Duration) {
        let now = Instant::now();
        let mut cache = self.cache.write().await;
        cache.retain(|_, entry| entry.expires_at > now);
        cache.insert(
            key,
            CacheEntry {
                expires_at: now + ttl,
                body,
            },
        );
    }

    /// GETs `path` (with optional `?url=` slug). A 404 yields `None`;
    /// successful bodies are cached under the full request key.
    async fn fetch(
        &self,
        path: &str,
        slug: Option<&str>,
        class: CacheClass,
    ) -> Result<Option<Value>, ContentError> {
        let key = match slug {
            Some(slug) => format!("{path}?url={slug}"),
            None => path.to_string(),
        };
        let ttl = self.ttl(class);
        if let Some(body) = self.cached(&key).await {
            tracing::debug!("content cache hit: {key}");
            return Ok(Some(body));
        }

        let mut req = self.client.get(format!("{}{path}", self.base_url));
        if let Some(slug) = slug {
            req = req.query(&[("url", slug)]);
        }
        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = match resp.json::<ErrorBody>().await {
                Ok(err) => err.error,
                Err(_) => "server error".to_string(),
            };
            return Err(ContentError::Server(format!("{status}: {message}")));
        }

        let body: Value = resp.json().await?;
        if !ttl.is_zero() {
            self.store(key, body.clone(), ttl).await;
        }
        Ok(Some(body))
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ContentError> {
        let body = self
            .fetch(path, None, CacheClass::List)
            .await?
            .ok_or_else(|| ContentError::NotFound(path.to_string()))?;
        decode(body)
    }

    async fn detail<T: DeserializeOwned>(
        &self,
        path: &str,
        slug: &str,
    ) -> Result<Option<T>, ContentError> {
        self.fetch(path, Some(slug), CacheClass::Detail)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn blogs(&self) -> Result<Vec<BlogView>, ContentError> {
        self.list("/api/blogs").await
    }

    pub async fn home_blogs(&self) -> Result<Vec<BlogView>, ContentError> {
        self.list("/api/home-blogs").await
    }

    pub async fn blog_detail(&self, slug: &str) -> Result<Option<BlogView>, ContentError> {
        self.detail("/api/blog-detail", slug).await
    }

    pub async fn courses(&self) -> Result<Vec<CourseView>, ContentError> {
        self.list("/api/courses").await
    }

    pub async fn home_courses(&self) -> Result<Vec<CourseView>, ContentError> {
        self.list("/api/home-courses").await
    }

    pub async fn course_detail(&self, slug: &str) -> Result<Option<CourseView>, ContentError> {
        self.detail("/api/course-detail", slug).await
    }

    /// Lessons of a course; `None` when the course does not exist.
    pub async fn lessons_by_course(
        &self,
        slug: &str,
    ) -> Result<Option<Vec<LessonView>>, ContentError> {
        self.detail("/api/lessons-by-course", slug).await
    }

    /// Drops every cached response.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ContentError> {
    serde_json::from_value(body)
        .map_err(|err| ContentError::Server(format!("unexpected response body: {err}")))
}
