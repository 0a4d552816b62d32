use alumni_api::config::AppConfig;
use alumni_auth::{Role, TokenCodec};
use alumni_core::AccountId;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::{StatusCode, header};
use serde_json::{Value, json};

const SECRET: &str = "black-box-test-secret-0123456789abcdef";
const ADMIN_EMAIL: &str = "admin@alumni.edu";
const ADMIN_PASSWORD: &str = "admin-pass-1";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(AppConfig::for_tests(SECRET).with_admin(ADMIN_EMAIL, "Admin User", ADMIN_PASSWORD))
            .await
    }

    async fn spawn_with(config: AppConfig) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = alumni_api::app::build_app(&config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Client that keeps cookies and does not follow redirects.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn session_cookie_value(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("auth-token="))
        .map(str::to_string)
}

fn token_from_set_cookie(set_cookie: &str) -> String {
    set_cookie
        .trim_start_matches("auth-token=")
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn mint_token(sub: &str, role: Role, now: chrono::DateTime<Utc>) -> String {
    let codec = TokenCodec::new(SECRET).unwrap();
    let (token, _) = codec.issue(sub.parse::<AccountId>().unwrap(), role, now).unwrap();
    token
}

async fn register(client: &reqwest::Client, server: &TestServer, name: &str, email: &str) -> reqwest::Response {
    client
        .post(server.url("/api/auth/register"))
        .json(&json!({
            "name": name,
            "email": email,
            "password": "secret123",
            "batch": "2019",
            "department": "Physics",
        }))
        .send()
        .await
        .unwrap()
}

async fn login(client: &reqwest::Client, server: &TestServer, email: &str, password: &str) -> reqwest::Response {
    client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_ungated() {
    let server = TestServer::spawn().await;
    let res = client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_login_issues_cookie_for_the_new_account() {
    let server = TestServer::spawn().await;
    let client = client();

    let res = register(&client, &server, "Ada Lovelace", "Ada@Example.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registration successful");
    let id = body["user"]["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("ALM-") && id.ends_with("-001"), "unexpected id {id}");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["user"]["status"], "active");
    assert!(body["user"].get("password").is_none());

    let res = login(&client, &server, "ada@example.com", "secret123").await;
    assert_eq!(res.status(), StatusCode::OK);
    let set_cookie = session_cookie_value(&res).expect("login should set the session cookie");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("Max-Age=86400"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["redirectUrl"], "/events");
    assert_eq!(body["user"]["id"], id.as_str());

    let claims = TokenCodec::new(SECRET)
        .unwrap()
        .decode(&token_from_set_cookie(&set_cookie), Utc::now())
        .unwrap();
    assert_eq!(claims.sub.as_str(), id);
    assert_eq!(claims.role, Role::User);
    assert_eq!(claims.expires_at - claims.issued_at, ChronoDuration::hours(24));

    // The cookie store now carries the session.
    let res = client.get(server.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["id"], id.as_str());
}

#[tokio::test]
async fn me_without_session_is_unauthorized() {
    let server = TestServer::spawn().await;
    let res = client().get(server.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_authenticated");
    assert_eq!(body["message"], "Not authenticated");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let server = TestServer::spawn().await;
    let client = client();
    register(&client, &server, "Ada", "ada@example.com").await;

    let wrong_password = login(&client, &server, "ada@example.com", "nope-nope").await;
    let status_a = wrong_password.status();
    assert!(session_cookie_value(&wrong_password).is_none());
    let body_a: Value = wrong_password.json().await.unwrap();

    let unknown = login(&client, &server, "ghost@example.com", "secret123").await;
    let status_b = unknown.status();
    let body_b: Value = unknown.json().await.unwrap();

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_a, status_b);
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["message"], "Invalid email or password");
}

#[tokio::test]
async fn login_requires_both_fields() {
    let server = TestServer::spawn().await;
    let res = client()
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "ada@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_fields");
    assert_eq!(body["message"], "Email and password are required");
}

#[tokio::test]
async fn registration_validation_errors() {
    let server = TestServer::spawn().await;
    let client = client();

    let cases = [
        (json!({ "email": "a@b.co", "password": "secret123" }), "missing_field"),
        (json!({ "name": "A", "email": "not-an-email", "password": "secret123" }), "invalid_email"),
        (json!({ "name": "A", "email": "a@b.co", "password": "short" }), "weak_password"),
    ];
    for (payload, code) in cases {
        let res = client
            .post(server.url("/api/auth/register"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{payload}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], code, "{payload}");
    }

    assert_eq!(register(&client, &server, "A", "a@b.co").await.status(), StatusCode::OK);
    let res = register(&client, &server, "A again", "A@B.CO").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "duplicate_email");
}

#[tokio::test]
async fn registration_stops_at_capacity() {
    let server = TestServer::spawn_with(
        AppConfig::for_tests(SECRET)
            .with_capacity(2)
            .with_admin(ADMIN_EMAIL, "Admin User", ADMIN_PASSWORD),
    )
    .await;
    let client = client();

    assert_eq!(register(&client, &server, "One", "one@example.com").await.status(), StatusCode::OK);
    assert_eq!(register(&client, &server, "Two", "two@example.com").await.status(), StatusCode::OK);

    let res = register(&client, &server, "Three", "three@example.com").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "capacity_reached");

    // The administrator does not consume a slot and still logs in.
    let res = login(&client, &server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.get(server.url("/api/auth/stats")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stats"]["totalUsers"], 2);
    assert_eq!(body["stats"]["availableSlots"], 0);
    assert_eq!(body["stats"]["isCapacityFull"], true);
}

#[tokio::test]
async fn restricted_page_without_cookie_redirects_to_login_with_return_target() {
    let server = TestServer::spawn().await;
    let res = client().get(server.url("/profile")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap(),
        "/?returnUrl=%2Fprofile"
    );

    let res = client().get(server.url("/admin/users")).send().await.unwrap();
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap(),
        "/?returnUrl=%2Fadmin%2Fusers"
    );

    // The admin login page sits under the admin prefix; sign-in goes through
    // the portal login at `/`.
    let res = client().get(server.url("/admin/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap(),
        "/?returnUrl=%2Fadmin%2Flogin"
    );
}

#[tokio::test]
async fn expired_or_forged_cookie_redirects_to_login() {
    let server = TestServer::spawn().await;
    let expired = mint_token("ALM-2024-001", Role::User, Utc::now() - ChronoDuration::days(2));
    for token in [expired.as_str(), "not.a.token"] {
        let res = client()
            .get(server.url("/profile"))
            .header(header::COOKIE, format!("auth-token={token}"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/?returnUrl=%2Fprofile");
    }
}

#[tokio::test]
async fn user_on_admin_page_is_sent_to_not_authorized_page() {
    let server = TestServer::spawn().await;
    let client = client();
    register(&client, &server, "Ada", "ada@example.com").await;
    assert_eq!(login(&client, &server, "ada@example.com", "secret123").await.status(), StatusCode::OK);

    let res = client.get(server.url("/admin")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap(),
        "/events?error=admin_access_required"
    );

    let res = client.get(server.url("/profile")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("x-user-role").unwrap(), "user");
    let expected_id = format!("ALM-{}-001", Utc::now().format("%Y"));
    assert_eq!(res.headers().get("x-user-id").unwrap(), expected_id.as_str());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["page"], "profile");
    assert_eq!(body["viewer"]["role"], "user");
}

#[tokio::test]
async fn admin_reaches_admin_and_user_pages() {
    let server = TestServer::spawn().await;
    let client = client();
    let res = login(&client, &server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["redirectUrl"], "/admin");
    assert_eq!(body["user"]["id"], "admin-1");

    for path in ["/admin", "/admin/users/ALM-2024-001", "/profile", "/register/7"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.headers().get("x-user-role").unwrap(), "admin");
        assert_eq!(res.headers().get("x-user-id").unwrap(), "admin-1");
    }
}

#[tokio::test]
async fn public_pages_need_no_session() {
    let server = TestServer::spawn().await;
    for path in ["/", "/events", "/register-user", "/register/1", "/register/4"] {
        let res = client().get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        let body: Value = res.json().await.unwrap();
        assert!(body["viewer"].is_null());
    }

    // Steps past the public ones fall under the member prefix.
    let res = client().get(server.url("/register/5")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn status_update_requires_admin_and_is_visible_in_listing() {
    let server = TestServer::spawn().await;
    let member = client();
    let res = register(&member, &server, "Ada", "ada@example.com").await;
    let body: Value = res.json().await.unwrap();
    let id = body["user"]["id"].as_str().unwrap().to_string();
    login(&member, &server, "ada@example.com", "secret123").await;

    let status_url = server.url(&format!("/api/users/{id}/status"));

    let res = member
        .patch(&status_url)
        .json(&json!({ "status": "suspended" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "admin_required");

    let anonymous = client()
        .patch(&status_url)
        .json(&json!({ "status": "suspended" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

    let admin = client();
    login(&admin, &server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = admin
        .patch(&status_url)
        .json(&json!({ "status": "suspended" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User status updated to suspended");

    let res = admin.get(server.url("/api/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["id"], id.as_str());
    assert_eq!(body["users"][0]["status"], "suspended");

    let res = member.get(server.url("/api/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn status_update_rejects_bad_status_and_unknown_account() {
    let server = TestServer::spawn().await;
    let admin = client();
    login(&admin, &server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = admin
        .patch(server.url("/api/users/ALM-2024-001/status"))
        .json(&json!({ "status": "banned" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_status");

    let res = admin
        .patch(server.url("/api/users/ALM-2024-999/status"))
        .json(&json!({ "status": "active" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Administrators are not subject to status changes.
    let res = admin
        .patch(server.url("/api/users/admin-1/status"))
        .json(&json!({ "status": "suspended" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_are_admin_only() {
    let server = TestServer::spawn().await;
    let res = client().get(server.url("/api/auth/stats")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = client();
    login(&admin, &server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = admin.get(server.url("/api/auth/stats")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["stats"]["totalUsers"], 0);
    assert_eq!(body["stats"]["availableSlots"], 1000);
    assert_eq!(body["stats"]["isCapacityFull"], false);
}

#[tokio::test]
async fn logout_clears_cookie_but_does_not_revoke_token() {
    let server = TestServer::spawn().await;
    let client = client();
    register(&client, &server, "Ada", "ada@example.com").await;
    let res = login(&client, &server, "ada@example.com", "secret123").await;
    let token = token_from_set_cookie(&session_cookie_value(&res).unwrap());

    let res = client.post(server.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = session_cookie_value(&res).expect("logout should reset the cookie");
    assert!(cleared.starts_with("auth-token=;"));
    assert!(cleared.contains("Max-Age=0"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully");

    // No revocation list: a copied token stays valid until it expires.
    let res = reqwest::Client::new()
        .get(server.url("/api/auth/me"))
        .header(header::COOKIE, format!("auth-token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
