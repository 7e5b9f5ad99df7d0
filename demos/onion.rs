use stratum::config::AppConfig;
use stratum::functional::{handler, middleware};
use stratum::logging;
use stratum::prelude::{Handler, Request, Response, Result};
use stratum::registry::Registry;

const CONFIG: &str = r#"
[server]
addr = "127.0.0.1:8080"

[[auth.tokens]]
token = "letmein"
user = "admin"
role = "admin"

[[routes]]
path = "/"
handler = "home"
middleware = ["logger", "recover", "outer", "inner"]

[[routes]]
path = "/admin/**"
handler = "home"
middleware = ["logger", "recover", "auth", "admin"]
"#;

async fn outer(req: Request, next: &dyn Handler) -> Result<Response> {
    tracing::info!("outer: before next");
    let res = next.handle(req).await;
    tracing::info!("outer: after next");
    res
}

async fn inner(req: Request, next: &dyn Handler) -> Result<Response> {
    tracing::info!("inner: before next");
    let res = next.handle(req).await;
    tracing::info!("inner: after next");
    res
}

async fn home(_: Request) -> &'static str {
    "hello"
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::from_toml_str(CONFIG)?,
    };
    logging::init(&config.logging)?;

    let router = Registry::with_builtins(&config)
        .middleware("outer", middleware(outer))
        .middleware("inner", middleware(inner))
        .handler("home", || handler(home))
        .build_router(&config.routes)?;

    router
        .into_server()
        .run_until(config.server.addr.as_str(), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
