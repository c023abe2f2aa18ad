use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{ads, auth, config::AppConfig, images, state::AppState, users};

pub fn build_app(state: AppState) -> Router {
    let uploads = images::handlers::uploads_routes(&state.config.storage);

    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(ads::router())
        .merge(uploads)
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis();
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "adboard-test-boundary";

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, body)
    }

    fn json_req(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        req.body(Body::empty()).unwrap()
    }

    fn multipart_req(
        method: Method,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &[u8])],
    ) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (i, (content_type, bytes)) in files.iter().enumerate() {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{i}.img\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn register_and_login(app: &Router, name: &str, email: &str) -> String {
        let (status, body) = send(
            app,
            json_req(
                Method::POST,
                "/auth/register",
                None,
                json!({ "name": name, "email": email, "password": "password-123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["email"], email);
        assert!(body.get("password_hash").is_none());

        let (status, body) = send(
            app,
            json_req(
                Method::POST,
                "/auth/login",
                None,
                json!({ "email": email, "password": "password-123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().unwrap().to_string()
    }

    const AD_FIELDS: &[(&str, &str)] = &[
        ("title", "Bicycle"),
        ("description", "Barely ridden"),
        ("category", "Авто"),
        ("price", "120"),
        ("city", "Kyiv"),
    ];

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let res = app.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn auth_errors_have_expected_statuses() {
        let app = build_app(AppState::fake());
        register_and_login(&app, "Olha", "olha@mail.com").await;

        let (status, body) = send(
            &app,
            json_req(
                Method::POST,
                "/auth/register",
                None,
                json!({ "name": "Other", "email": "olha@mail.com", "password": "password-456" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Email already in use");

        let (status, body) = send(
            &app,
            json_req(
                Method::POST,
                "/auth/login",
                None,
                json!({ "email": "olha@mail.com", "password": "nope-nope" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("accessToken").is_none());

        let (status, body) = send(&app, get("/users/profile", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "No token provided");

        let (status, body) = send(&app, get("/users/profile", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn profile_read_and_update() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "Olha", "olha@mail.com").await;

        let (status, body) = send(&app, get("/users/profile", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Olha");

        let (status, body) = send(
            &app,
            json_req(Method::PUT, "/users/profile", Some(&token), json!({ "name": "Olha P." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Olha P.");
        assert_eq!(body["email"], "olha@mail.com");
    }

    #[tokio::test]
    async fn ad_lifecycle_over_http() {
        let app = build_app(AppState::fake());
        let owner = register_and_login(&app, "Owner", "owner@mail.com").await;
        let other = register_and_login(&app, "Other", "other@mail.com").await;

        let (status, created) = send(
            &app,
            multipart_req(Method::POST, "/ads", &owner, AD_FIELDS, &[("image/png", &b"png-bytes"[..])]),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        let id = created["id"].as_str().unwrap().to_string();
        let first_image = created["images"][0].as_str().unwrap().to_string();
        assert!(first_image.starts_with("uploads/ads/"));
        assert_eq!(created["isOwner"], true);

        let (status, page) = send(&app, get("/ads?city=Kyiv&minPrice=100&maxPrice=150", Some(&owner))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
        assert_eq!(page["totalPages"], 1);
        assert_eq!(page["ads"][0]["isOwner"], true);

        let (_, page) = send(&app, get("/ads", None)).await;
        assert_eq!(page["ads"][0]["isOwner"], false);
        let (_, page) = send(&app, get("/ads?search=bicycle", Some(&other))).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["ads"][0]["isOwner"], false);

        let (status, _) = send(&app, get("/ads?maxPrice=cheap", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/ads/{id}");
        let (status, body) = send(
            &app,
            multipart_req(Method::PUT, &uri, &other, &[("title", "stolen")], &[]),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Not authorized");
        let (status, body) = send(&app, get(&uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Bicycle");

        let existing = serde_json::to_string(&vec![first_image.clone()]).unwrap();
        let (status, updated) = send(
            &app,
            multipart_req(
                Method::PUT,
                &uri,
                &owner,
                &[("price", "99.5"), ("existingImages", existing.as_str())],
                &[("image/jpeg", &b"jpeg-bytes"[..])],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{updated}");
        assert_eq!(updated["price"], 99.5);
        assert_eq!(updated["images"][0], first_image.as_str());
        assert!(updated["images"][1].as_str().unwrap().ends_with(".jpg"));

        let req = Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {other}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.0, StatusCode::FORBIDDEN);

        let req = Request::builder()
            .method(Method::DELETE)
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {owner}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Ad deleted");

        let (status, _) = send(&app, get(&uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_requires_token_and_rejects_bad_forms() {
        let app = build_app(AppState::fake());
        let token = register_and_login(&app, "Owner", "owner@mail.com").await;

        let (status, _) = send(
            &app,
            multipart_req(Method::POST, "/ads", "not-a-token", AD_FIELDS, &[]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let six: Vec<(&str, &[u8])> = (0..6).map(|_| ("image/png", &b"x"[..])).collect();
        let (status, body) = send(&app, multipart_req(Method::POST, "/ads", &token, AD_FIELDS, &six)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "At most 5 images are allowed");

        let (status, _) = send(
            &app,
            multipart_req(Method::POST, "/ads", &token, AD_FIELDS, &[("text/plain", &b"hi"[..])]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, multipart_req(Method::POST, "/ads", &token, &AD_FIELDS[..4], &[])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_ad_id_is_not_found() {
        let app = build_app(AppState::fake());
        let (status, body) = send(&app, get("/ads/not-a-uuid", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Ad not found");
    }
}
