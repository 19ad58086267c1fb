//! Shared fixtures for HTTP-level tests: an in-memory repository, a stub
//! geocoder, a temp-dir media store and RS256 tokens signed with the test key.
#![allow(dead_code)]

use actix_web::body::to_bytes;
use actix_web::http::{header, Method, StatusCode};
use actix_web::{dev::ServiceResponse, test, web, App};
use async_trait::async_trait;
use chrono::Utc;
use crypto_core::jwt::{self, Claims};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use photo_service::config::MediaConfig;
use photo_service::db::PhotoRepository;
use photo_service::error::{AppError, Result};
use photo_service::geocoding::ReverseGeocoder;
use photo_service::models::{Comment, Image, Like, Location, NewLocation, Post};
use photo_service::routes::configure_routes;
use photo_service::storage::LocalMediaStorage;
use photo_service::AppState;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/jwt_test_private.pem");
const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/jwt_test_public.pem");

pub const BOUNDARY: &str = "photo-test-boundary-7MA4YWxkTrZu0gW";

// =====================================================================
// Tokens
// =====================================================================

pub fn init_jwt() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        jwt::initialize_jwt_validation_only(TEST_PUBLIC_KEY)
            .expect("Failed to initialize test JWT key");
    });
}

pub fn sign_token(user_id: Uuid, username: &str, token_type: &str, expires_in_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + expires_in_secs,
        token_type: token_type.to_string(),
        username: username.to_string(),
    };
    encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap()
}

/// A user with a valid access token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

impl TestUser {
    pub fn new(username: &str) -> Self {
        init_jwt();
        let id = Uuid::new_v4();
        Self {
            id,
            username: username.to_string(),
            token: sign_token(id, username, "access", 3600),
        }
    }

    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }
}

// =====================================================================
// In-memory repository
// =====================================================================

#[derive(Default)]
struct Tables {
    users: Vec<(Uuid, String)>,
    posts: Vec<Post>,
    images: Vec<Image>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    locations: Vec<Location>,
}

impl Tables {
    fn remove_post(&mut self, post_id: Uuid) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != post_id);
        self.images.retain(|i| i.post_id != post_id);
        self.comments.retain(|c| c.post_id != post_id);
        self.likes.retain(|l| l.post_id != post_id);
        self.locations.retain(|l| l.post_id != post_id);
        self.posts.len() < before
    }
}

/// Keeps rows in insertion order and applies the same cascades as the schema.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    /// When set, `add_image` fails after the post row was written
    pub fail_image_inserts: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn post_count(&self) -> usize {
        self.tables().posts.len()
    }

    pub fn image_count(&self, post_id: Uuid) -> usize {
        self.tables().images.iter().filter(|i| i.post_id == post_id).count()
    }

    pub fn comment_count(&self, post_id: Uuid) -> usize {
        self.tables().comments.iter().filter(|c| c.post_id == post_id).count()
    }

    pub fn like_count(&self, post_id: Uuid) -> usize {
        self.tables().likes.iter().filter(|l| l.post_id == post_id).count()
    }

    pub fn has_location(&self, post_id: Uuid) -> bool {
        self.tables().locations.iter().any(|l| l.post_id == post_id)
    }

    pub fn username(&self, user_id: Uuid) -> Option<String> {
        self.tables()
            .users
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, name)| name.clone())
    }

    pub fn image_refs(&self, post_id: Uuid) -> Vec<String> {
        self.tables()
            .images
            .iter()
            .filter(|i| i.post_id == post_id)
            .map(|i| i.image.clone())
            .collect()
    }
}

#[async_trait]
impl PhotoRepository for InMemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_user(&self, user_id: Uuid, username: &str) -> Result<()> {
        let mut tables = self.tables();
        match tables.users.iter().position(|(id, _)| *id == user_id) {
            Some(idx) if !username.is_empty() => tables.users[idx].1 = username.to_string(),
            Some(_) => {}
            None => tables.users.push((user_id, username.to_string())),
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let mut tables = self.tables();
        let before = tables.users.len();
        tables.users.retain(|(id, _)| *id != user_id);
        let owned: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == user_id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|c| c.author_id != user_id);
        tables.likes.retain(|l| l.user_id != user_id);
        Ok(tables.users.len() < before)
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        Ok(self
            .tables()
            .posts
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.tables().posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn create_post(&self, author_id: Uuid, text: &str) -> Result<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.tables().posts.push(post.clone());
        Ok(post)
    }

    async fn update_post_text(&self, post_id: Uuid, text: &str) -> Result<Option<Post>> {
        let mut tables = self.tables();
        Ok(tables.posts.iter_mut().find(|p| p.id == post_id).map(|p| {
            p.text = text.to_string();
            p.clone()
        }))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        Ok(self.tables().remove_post(post_id))
    }

    async fn add_image(&self, post_id: Uuid, image: &str) -> Result<Image> {
        if self.fail_image_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("image insert failed".to_string()));
        }
        let image = Image {
            id: Uuid::new_v4(),
            post_id,
            image: image.to_string(),
            created_at: Utc::now(),
        };
        self.tables().images.push(image.clone());
        Ok(image)
    }

    async fn images_for_post(&self, post_id: Uuid) -> Result<Vec<Image>> {
        Ok(self
            .tables()
            .images
            .iter()
            .filter(|i| i.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn set_location(&self, post_id: Uuid, location: &NewLocation) -> Result<Location> {
        let mut tables = self.tables();
        tables.locations.retain(|l| l.post_id != post_id);
        let location = Location {
            id: Uuid::new_v4(),
            post_id,
            name: location.name.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        };
        tables.locations.push(location.clone());
        Ok(location)
    }

    async fn location_for_post(&self, post_id: Uuid) -> Result<Option<Location>> {
        Ok(self
            .tables()
            .locations
            .iter()
            .find(|l| l.post_id == post_id)
            .cloned())
    }

    async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<(Like, bool)> {
        let mut tables = self.tables();
        if let Some(like) = tables
            .likes
            .iter()
            .find(|l| l.post_id == post_id && l.user_id == user_id)
        {
            return Ok((like.clone(), false));
        }
        let like = Like {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            created_at: Utc::now(),
        };
        tables.likes.push(like.clone());
        Ok((like, true))
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<i64> {
        Ok(self.like_count(post_id) as i64)
    }

    async fn comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self
            .tables()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(&self, post_id: Uuid, author_id: Uuid, text: &str) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.tables().comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        Ok(self
            .tables()
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .cloned())
    }

    async fn update_comment_text(&self, comment_id: Uuid, text: &str) -> Result<Option<Comment>> {
        let mut tables = self.tables();
        Ok(tables.comments.iter_mut().find(|c| c.id == comment_id).map(|c| {
            c.text = text.to_string();
            c.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
        let mut tables = self.tables();
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != comment_id);
        Ok(tables.comments.len() < before)
    }
}

// =====================================================================
// Geocoder
// =====================================================================

/// Answers every lookup with a fixed address and counts calls
pub struct StubGeocoder {
    address: Option<String>,
    pub calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn answering(address: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            address: address.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for StubGeocoder {
    async fn reverse(&self, _latitude: f64, _longitude: f64) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.address.clone()
    }
}

// =====================================================================
// Application
// =====================================================================

pub struct TestContext {
    pub repo: Arc<InMemoryRepository>,
    pub geocoder: Arc<StubGeocoder>,
    pub media_dir: TempDir,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_geocoder(StubGeocoder::answering(Some("Central Park, Manhattan, New York")))
    }

    pub fn with_geocoder(geocoder: Arc<StubGeocoder>) -> Self {
        init_jwt();
        let repo = InMemoryRepository::new();
        let media_dir = tempfile::tempdir().unwrap();
        let media = MediaConfig {
            root: media_dir.path().to_string_lossy().to_string(),
            url: "/media/".to_string(),
            max_upload_bytes: 1024,
            max_upload_files: 3,
            max_form_bytes: 4096,
        };
        let state = AppState::new(
            repo.clone(),
            Arc::new(LocalMediaStorage::new(media_dir.path())),
            geocoder.clone(),
            media,
        );

        Self {
            repo,
            geocoder,
            media_dir,
            state,
        }
    }
}

pub async fn init_app(
    ctx: &TestContext,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.state.clone()))
            .configure(configure_routes),
    )
    .await
}

// =====================================================================
// Multipart bodies
// =====================================================================

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn image<'a>(file_name: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "images",
        file_name,
        content_type: "image/jpeg",
        bytes,
    }
}

/// Encode parts as `multipart/form-data`; returns the content type header value and body
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

// =====================================================================
// Requests
// =====================================================================

/// Send a request and decode the JSON body (`Null` when empty).
/// Errors raised by middleware are rendered the way the server would.
pub async fn send<S>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let (status, body) = match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            (status, test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            (status, to_bytes(resp.into_body()).await.unwrap())
        }
    };

    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub fn multipart_request(
    method: Method,
    uri: &str,
    user: &TestUser,
    parts: &[Part<'_>],
) -> actix_http::Request {
    let (content_type, body) = multipart(parts);
    test::TestRequest::default()
        .method(method)
        .uri(uri)
        .insert_header(user.bearer())
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
        .to_request()
}

pub fn authed(method: Method, uri: &str, user: &TestUser) -> test::TestRequest {
    test::TestRequest::default()
        .method(method)
        .uri(uri)
        .insert_header(user.bearer())
}
