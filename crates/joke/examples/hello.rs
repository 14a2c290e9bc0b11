//! Minimal application: `cargo run -p joke --example hello`, then
//! `curl localhost:8000/name/Alex`.

use joke::prelude::*;

struct Greeter {
    app: Arc<AppConfig>,
}

impl Injectable for Greeter {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::config::<AppConfig>("app")]
    }

    fn construct(args: &Arguments) -> Result<Self, CoreError> {
        Ok(Self {
            app: args.service::<AppConfig>("app")?,
        })
    }
}

impl Greeter {
    fn greet(&self, args: &Arguments) -> JokeResult<String> {
        Ok(format!("Hi {}, from {}", args.string("name")?, self.app.name))
    }
}

fn routes(router: &Router) -> JokeResult<()> {
    router.get(
        "/name/{name:slug}",
        Handler::controller::<Greeter, _, _>("greet", vec![Parameter::string("name")], Greeter::greet),
        Some("greet"),
    )?;
    router.get(
        "/health",
        Handler::function(Vec::new(), |_| Json(json!({"status": "ok"}))),
        None,
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = Application::from_env()?;
    init_logging(LoggingConfig::from_app_config(app.config()))?;

    app.add_middleware(LoggingMiddleware::new().with_request_id_header(), Some("log"), &[]);
    app.load_routes(&["web"], routes)?;

    Server::new(app).run().await?;
    Ok(())
}
