//! Typed REST client for the iSPEAK backend.
//!
//! Every call carries the session's bearer token when there is one. Error
//! bodies of the form `{"error": "..."}` are surfaced as their message.

use std::fmt;

use common::jobs::JobStatus;
use common::model::blog::{BlogCategory, BlogPost};
use common::model::media::{FolderCount, Media, MediaPage, UploadedMedia};
use common::model::order::Order;
use common::model::product::{Product, ProductCollection};
use common::model::user::{AuthSession, User};
use common::upload::UploadPolicy;
use common::requests::{
    BlogPostInput, CreateOrderRequest, LoginRequest, MediaQuery, MediaUpdate, ProductUpdate,
    RegisterRequest, StockAdjustRequest, UploadUrlRequest,
};
use gloo_net::http::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use web_sys::FormData;

use crate::session::Session;

/// Origin of the backend, fixed at build time. Empty means same origin.
pub const API_BASE: &str = match option_env!("ISPEAK_API_URL") {
    Some(url) => url,
    None => "",
};

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    Network(String),
    Unauthorized,
    Server { status: u16, message: String },
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e) => write!(f, "Network error: {}", e),
            ApiError::Unauthorized => f.write_str("Please sign in again"),
            ApiError::Server { message, .. } => f.write_str(message),
            ApiError::Decode(e) => write!(f, "Unexpected response: {}", e),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct JobAccepted {
    job_id: String,
}

#[derive(Deserialize)]
struct JobPoll {
    status: JobStatus,
}

fn encode(value: &str) -> String {
    String::from(js_sys::encode_uri_component(value))
}

/// `?a=1&b=2` from the pairs that have a value, or an empty string.
pub fn query_string(pairs: &[(&str, Option<String>)]) -> String {
    let parts: Vec<String> = pairs
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", key, encode(v)))
        })
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiClient {
    token: Option<String>,
}

impl ApiClient {
    pub fn new(session: &Session) -> Self {
        Self {
            token: session.token().map(str::to_string),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = RequestBuilder::new(&format!("{}{}", API_BASE, path)).method(method);
        match &self.token {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        if response.ok() {
            return Ok(response);
        }
        let status = response.status();
        if status == 401 {
            return Err(ApiError::Unauthorized);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("Request failed with status {}", status),
        };
        Err(ApiError::Server { status, message })
    }

    async fn read<T: DeserializeOwned>(response: Result<Response, gloo_net::Error>) -> Result<T, ApiError> {
        let response = response.map_err(|e| ApiError::Network(e.to_string()))?;
        let response = Self::check(response).await?;
        response.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::read(self.request(Method::GET, path).send().await).await
    }

    pub async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self
            .request(method, path)
            .json(body)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Self::read(request.send().await).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check(response).await.map(|_| ())
    }

    /// Multipart upload. The browser sets the boundary header itself.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: FormData) -> Result<T, ApiError> {
        let request = self
            .request(Method::POST, path)
            .body(form)
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::read(request.send().await).await
    }

    // ---- account ----------------------------------------------------------

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthSession, ApiError> {
        self.send(Method::POST, "/api/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthSession, ApiError> {
        self.send(Method::POST, "/api/auth/register", request).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("/api/auth/me").await
    }

    // ---- catalog ----------------------------------------------------------

    /// The storefront catalog.
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.get("/api/products?limit=500").await
    }

    /// Every product in every status, uncapped. Admin only.
    pub async fn all_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get("/api/admin/products").await
    }

    pub async fn collections(&self) -> Result<Vec<ProductCollection>, ApiError> {
        self.get("/api/collections").await
    }

    pub async fn update_product(&self, id: i64, update: &ProductUpdate) -> Result<Product, ApiError> {
        self.send(Method::PUT, &format!("/api/products/{}", id), update).await
    }

    pub async fn adjust_stock(&self, id: i64, delta: i64) -> Result<Product, ApiError> {
        self.send(
            Method::PATCH,
            &format!("/api/products/{}/stock", id),
            &StockAdjustRequest { delta },
        )
        .await
    }

    // ---- media ------------------------------------------------------------

    pub async fn media(&self, query: &MediaQuery) -> Result<MediaPage, ApiError> {
        let qs = query_string(&[
            ("search", query.search.clone()),
            ("folder", query.folder.clone()),
            ("type", query.mime_type.clone()),
            ("limit", query.limit.map(|v| v.to_string())),
            ("offset", query.offset.map(|v| v.to_string())),
        ]);
        self.get(&format!("/api/media{}", qs)).await
    }

    /// The upload ceiling and compression settings the server enforces.
    pub async fn upload_policy(&self) -> Result<UploadPolicy, ApiError> {
        self.get("/api/media/policy").await
    }

    pub async fn media_folders(&self) -> Result<Vec<FolderCount>, ApiError> {
        self.get("/api/media/folders").await
    }

    pub async fn upload_media(&self, form: FormData) -> Result<UploadedMedia, ApiError> {
        self.upload("/api/media/upload", form).await
    }

    pub async fn import_media(&self, request: &UploadUrlRequest) -> Result<UploadedMedia, ApiError> {
        self.send(Method::POST, "/api/media/upload-url", request).await
    }

    pub async fn update_media(&self, id: i64, update: &MediaUpdate) -> Result<Media, ApiError> {
        self.send(Method::PUT, &format!("/api/media/{}", id), update).await
    }

    pub async fn get_media(&self, id: i64) -> Result<Media, ApiError> {
        self.get(&format!("/api/media/{}", id)).await
    }

    pub async fn delete_media(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/media/{}", id)).await
    }

    pub async fn analyze_media(&self, id: i64) -> Result<String, ApiError> {
        self.send::<_, JobAccepted>(Method::POST, &format!("/api/media/{}/analyze", id), &())
            .await
            .map(|accepted| accepted.job_id)
    }

    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError> {
        self.get::<JobPoll>(&format!("/api/jobs/{}", encode(job_id)))
            .await
            .map(|poll| poll.status)
    }

    // ---- blog -------------------------------------------------------------

    pub async fn blog_categories(&self) -> Result<Vec<BlogCategory>, ApiError> {
        self.get("/api/blog/categories").await
    }

    pub async fn create_post(&self, input: &BlogPostInput) -> Result<BlogPost, ApiError> {
        self.send(Method::POST, "/api/blog", input).await
    }

    // ---- orders -----------------------------------------------------------

    pub async fn place_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        self.send(Method::POST, "/api/orders", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;

    #[test]
    fn server_errors_show_the_backend_message() {
        let err = ApiError::Server {
            status: 413,
            message: "Unable to compress image below 200KB. Please use a smaller image.".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unable to compress image below 200KB. Please use a smaller image."
        );
        assert_eq!(ApiError::Unauthorized.to_string(), "Please sign in again");
    }
}
