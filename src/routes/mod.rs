use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod analytics;
mod auth;
mod extract;
mod health;
mod middleware_auth;
mod tasks;

pub use auth::ensure_demo_user;
pub use health::health;
pub use middleware_auth::TokenKeys;

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_api = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/tasks", post(tasks::routes::create).get(tasks::routes::list))
        .route(
            "/tasks/{id}",
            get(tasks::routes::get)
                .put(tasks::routes::update)
                .delete(tasks::routes::delete),
        )
        .route("/tasks/{id}/status", patch(tasks::routes::update_status))
        .route("/analytics/stats", get(analytics::routes::stats))
        .route("/analytics/trends", get(analytics::routes::trends))
        .route("/analytics/overview", get(analytics::routes::overview))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_auth::require_auth,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", public_api.merge(protected_api))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "QuickTask API"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        app: Router,
        state: AppState,
    }

    impl TestApp {
        fn new() -> Self {
            let state = AppState::in_memory(TokenKeys::new("test-secret", Duration::hours(1)));
            Self {
                app: routes(state.clone()),
                state,
            }
        }

        fn token_for(&self, user_id: Uuid) -> String {
            self.state.tokens.issue(user_id).unwrap()
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let resp = self.app.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        async fn create_task(&self, token: &str, body: Value) -> Value {
            let (status, resp) = self
                .send(Method::POST, "/api/tasks", Some(token), Some(body))
                .await;
            assert_eq!(status, StatusCode::CREATED, "{resp}");
            resp["task"].clone()
        }
    }

    fn task_body(title: &str, priority: &str, status: &str, due: &str) -> Value {
        json!({
            "title": title,
            "priority": priority,
            "status": status,
            "dueDate": due,
        })
    }

    fn titles(resp: &Value) -> Vec<String> {
        resp["tasks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 200);
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let app = TestApp::new();

        let (status, body) = app.send(Method::GET, "/api/tasks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = app
            .send(Method::GET, "/api/analytics/stats", Some("garbage"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_login_me() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"fullName": "Ada", "email": "Ada@Example.com", "password": "longenough"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert!(body["user"].get("passwordHash").is_none());

        let (status, _) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"fullName": "Ada", "email": "ada@example.com", "password": "longenough"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, login) = app
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "ada@example.com", "password": "longenough"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = login["token"].as_str().unwrap();

        let (status, me) = app.send(Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["user"]["fullName"], "Ada");
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"fullName": "Ada", "email": "ada@example.com", "password": "short"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password must be at least 8 characters long");
    }

    #[tokio::test]
    async fn test_listing_filters_and_sorts() {
        let app = TestApp::new();
        let token = app.token_for(Uuid::new_v4());

        app.create_task(&token, task_body("Quarterly Report", "High", "Completed", "2024-07-05")).await;
        app.create_task(&token, task_body("Team Sync", "Low", "Todo", "2024-07-01")).await;
        app.create_task(&token, task_body("Close books", "Medium", "Completed", "2024-07-02")).await;
        app.create_task(&token, task_body("Plan sprint", "High", "In Progress", "2024-07-03")).await;
        app.create_task(&token, task_body("Hire intern", "Low", "Todo", "2024-07-04")).await;

        let (status, all) = app.send(Method::GET, "/api/tasks", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all["count"], 5);

        let (_, completed) = app
            .send(
                Method::GET,
                "/api/tasks?status=Completed&sortBy=dueDate&sortOrder=asc",
                Some(&token),
                None,
            )
            .await;
        assert_eq!(completed["count"], 2);
        assert_eq!(titles(&completed), vec!["Close books", "Quarterly Report"]);

        let (_, searched) = app
            .send(Method::GET, "/api/tasks?search=report", Some(&token), None)
            .await;
        assert_eq!(titles(&searched), vec!["Quarterly Report"]);

        let (_, in_progress) = app
            .send(Method::GET, "/api/tasks?status=In%20Progress", Some(&token), None)
            .await;
        assert_eq!(titles(&in_progress), vec!["Plan sprint"]);

        let (status, none) = app
            .send(Method::GET, "/api/tasks?priority=Urgent", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(none["count"], 0);
    }

    #[tokio::test]
    async fn test_tasks_are_owner_scoped() {
        let app = TestApp::new();
        let alice = app.token_for(Uuid::new_v4());
        let bob = app.token_for(Uuid::new_v4());

        let task = app
            .create_task(&alice, task_body("Alice only", "Medium", "Todo", "2024-07-01"))
            .await;
        let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

        let (_, listed) = app.send(Method::GET, "/api/tasks", Some(&bob), None).await;
        assert_eq!(listed["count"], 0);

        let (status, _) = app.send(Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(Method::PUT, &uri, Some(&bob), Some(json!({"title": "Hijacked"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.send(Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.send(Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["title"], "Alice only");

        let missing = format!("/api/tasks/{}", Uuid::new_v4());
        let (status, _) = app.send(Method::GET, &missing, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_requests_use_error_envelope() {
        let app = TestApp::new();
        let token = app.token_for(Uuid::new_v4());

        let (status, body) = app
            .send(Method::GET, "/api/tasks/not-a-uuid", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/tasks")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{bad json"))
            .unwrap();
        let resp = app.app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice::<Value>(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("JSON"));

        let (status, body) = app
            .send(Method::POST, "/api/auth/login", None, Some(json!({"email": 42})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let app = TestApp::new();
        let token = app.token_for(Uuid::new_v4());

        let (status, body) = app
            .send(
                Method::POST,
                "/api/tasks",
                Some(&token),
                Some(task_body("ok", "High", "Todo", "2024-07-01")),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Title must be at least 3 characters long");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/tasks",
                Some(&token),
                Some(task_body("Valid title", "Critical", "Todo", "2024-07-01")),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Priority must be Low, Medium, or High");
    }

    #[tokio::test]
    async fn test_update_status_and_delete() {
        let app = TestApp::new();
        let token = app.token_for(Uuid::new_v4());
        let task = app
            .create_task(&token, task_body("Ship release", "High", "Todo", "2024-07-01"))
            .await;
        assert_eq!(task["status"], "Todo");
        assert!(task["completedAt"].is_null());
        let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

        let (status, body) = app
            .send(Method::PATCH, &format!("{uri}/status"), Some(&token), Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please provide status");

        let (status, body) = app
            .send(
                Method::PATCH,
                &format!("{uri}/status"),
                Some(&token),
                Some(json!({"status": "Completed"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["status"], "Completed");
        assert!(body["task"]["completedAt"].is_string());

        let (status, body) = app
            .send(
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({"description": "with notes", "priority": "Low"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"]["title"], "Ship release");
        assert_eq!(body["task"]["priority"], "Low");
        assert_eq!(body["task"]["description"], "with notes");

        let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analytics_for_empty_owner() {
        let app = TestApp::new();
        let token = app.token_for(Uuid::new_v4());

        let (status, stats) = app
            .send(Method::GET, "/api/analytics/stats", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalTasks"], 0);
        assert_eq!(stats["completionPercentage"], 0);
        assert_eq!(stats["statusBreakdown"]["In Progress"], 0);

        let (status, trends) = app
            .send(Method::GET, "/api/analytics/trends", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trends["averageCompletionTime"], "N/A");
        assert_eq!(trends["tasksPerDay"].as_array().unwrap().len(), 7);
        assert_eq!(trends["weeklyStats"]["lastWeek"]["created"], 0);
    }

    #[tokio::test]
    async fn test_analytics_reflect_activity() {
        let app = TestApp::new();
        let token = app.token_for(Uuid::new_v4());
        app.create_task(&token, task_body("Done already", "High", "Completed", "2024-07-01")).await;
        app.create_task(&token, task_body("Still open", "Low", "Todo", "2024-07-02")).await;
        app.create_task(&token, task_body("Half way", "Low", "In Progress", "2024-07-03")).await;

        let (status, overview) = app
            .send(Method::GET, "/api/analytics/overview", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let stats = &overview["stats"];
        assert_eq!(stats["totalTasks"], 3);
        assert_eq!(stats["completedTasks"], 1);
        assert_eq!(stats["pendingTasks"], 2);
        assert_eq!(stats["completionPercentage"], 33);
        assert_eq!(stats["priorityBreakdown"], json!({"Low": 2, "Medium": 0, "High": 1}));

        let trends = &overview["trends"];
        let today = &trends["tasksPerDay"][6];
        assert_eq!(today["created"], 3);
        assert_eq!(today["completed"], 1);
        assert_eq!(trends["weeklyStats"]["currentWeek"], json!({"created": 3, "completed": 1}));
        assert_eq!(trends["averageCompletionTime"], "0.0 days");
    }
}
