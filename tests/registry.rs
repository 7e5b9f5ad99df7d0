use stratum::config::AppConfig;
use stratum::functional::handler;
use stratum::http::{header, Body, Method, StatusCode};
use stratum::prelude::*;
use stratum::registry::Registry;
use stratum::router::RouterExt;

const CONFIG: &str = r#"
    [rate_limit]
    capacity = 2
    refill_per_sec = 1

    [[auth.tokens]]
    token = "root-token"
    user = "root"
    role = "admin"

    [[auth.tokens]]
    token = "guest-token"
    user = "guest"

    [[routes]]
    path = "/"
    handler = "home"
    middleware = ["logger", "recover"]

    [[routes]]
    path = "/admin/**"
    handler = "admin"
    middleware = ["logger", "recover", "auth", "admin"]

    [[routes]]
    path = "/items/:id"
    handler = "item"
    middleware = ["recover", "rate_limit"]
"#;

async fn home(_: Request) -> &'static str {
    "home"
}

async fn admin(req: Request) -> String {
    format!("admin {}", req.tail().unwrap_or(""))
}

async fn item(req: Request) -> Result<String> {
    match req.parse_param::<u32>("id") {
        Some(Ok(id)) => Ok(format!("item {}", id)),
        _ => Err(StatusError::BAD_REQUEST.into()),
    }
}

fn registry(config: &AppConfig) -> Registry {
    Registry::with_builtins(config)
        .handler("home", || handler(home))
        .handler("admin", || handler(admin))
        .handler("item", || handler(item))
}

fn request(method: Method, path: &str, token: Option<&str>) -> Request {
    let mut builder = hyper::Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    Request::from(builder.body(Body::empty()).unwrap())
}

async fn body_of(res: Response) -> String {
    let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn configured_routes_are_composed() {
    let config = AppConfig::from_toml_str(CONFIG).unwrap();
    let router = registry(&config).build_router(&config.routes).unwrap();
    assert_eq!(router.len(), 3);

    let res = router.handle(request(Method::GET, "/", None)).await.unwrap();
    assert_eq!(body_of(res).await, "home");

    let res = router
        .handle(request(Method::GET, "/admin/users", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = router
        .handle(request(Method::GET, "/admin/users", Some("guest-token")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = router
        .handle(request(Method::GET, "/admin/users", Some("root-token")))
        .await
        .unwrap();
    assert_eq!(body_of(res).await, "admin users");

    let res = router
        .handle(request(Method::GET, "/nowhere/at/all", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recover_and_rate_limit_compose() {
    let config = AppConfig::from_toml_str(CONFIG).unwrap();
    let router = registry(&config).build_router(&config.routes).unwrap();

    let res = router.handle(request(Method::GET, "/items/7", None)).await.unwrap();
    assert_eq!(body_of(res).await, "item 7");

    let res = router.handle(request(Method::GET, "/items/x", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = router.handle(request(Method::GET, "/items/8", None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()[header::RETRY_AFTER], "1");
}

#[test]
fn unknown_handler_is_invalid_configuration() {
    let config = AppConfig::from_toml_str(
        r#"
        [[routes]]
        path = "/"
        handler = "missing"
        middleware = ["logger"]
        "#,
    )
    .unwrap();
    let err = registry(&config)
        .build_router(&config.routes)
        .err()
        .unwrap();
    assert!(matches!(err, ChainError::InvalidConfiguration(_)));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn unknown_middleware_is_invalid_configuration() {
    let config = AppConfig::from_toml_str(
        r#"
        [[routes]]
        path = "/"
        handler = "home"
        middleware = ["logger", "cors"]
        "#,
    )
    .unwrap();
    let err = registry(&config)
        .build_router(&config.routes)
        .err()
        .unwrap();
    assert!(err.to_string().contains("cors"));
}
