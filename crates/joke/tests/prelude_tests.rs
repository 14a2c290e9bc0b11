use joke::prelude::*;

struct Counter;

impl Injectable for Counter {
    fn construct(_: &Arguments) -> Result<Self, CoreError> {
        Ok(Counter)
    }
}

impl Invokable for Counter {
    fn signature() -> Vec<Parameter> {
        vec![Parameter::int("n")]
    }

    fn invoke(&self, args: &Arguments) -> JokeResult<HandlerOutput> {
        Ok(HandlerOutput::Json(json!({"next": args.int("n")? + 1})))
    }
}

#[test]
fn test_invokable_route_through_umbrella() {
    let app = Application::new();
    app.router()
        .get("/count/{n:int}", Handler::invokable::<Counter>(), None)
        .unwrap();

    let response = app.handle(JokeRequest::new(HttpMethod::Get, "/count/41"));
    assert_eq!(response.json(), Some(&json!({"next": 42})));
}

#[test]
fn test_framework_identity() {
    assert_eq!(joke::name(), "joke");
    assert!(!joke::version().is_empty());
}
