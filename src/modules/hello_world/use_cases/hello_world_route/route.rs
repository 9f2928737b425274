use crate::shared::infrastructure::engine::route::{RouteBuilder, RouteDefinition, simple};

pub const TIMER_URI: &str = "timer://foo?period=5000";
pub const LOG_URI: &str = "log:mylogger";
pub const GREETING: &str = "Hello, world!";

/// Every five seconds, replace the body with the greeting and log it.
pub struct HelloWorldRouter;

impl RouteBuilder for HelloWorldRouter {
    fn configure(&self) -> Vec<RouteDefinition> {
        vec![
            RouteDefinition::from(TIMER_URI)
                .set_body(simple(GREETING))
                .to(LOG_URI),
        ]
    }
}

#[cfg(test)]
mod hello_world_route_tests {
    use super::*;
    use crate::shared::infrastructure::engine::context::RouteContext;
    use crate::shared::infrastructure::engine::exchange::{Body, Exchange, Message};
    use crate::shared::infrastructure::engine::route::{Expression, Step};
    use rstest::rstest;

    #[rstest]
    fn it_should_declare_a_single_timer_to_log_route() {
        let routes = HelloWorldRouter.configure();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].from, "timer://foo?period=5000");
        assert_eq!(
            routes[0].steps,
            vec![
                Step::SetBody(Expression::Simple("Hello, world!".into())),
                Step::To("log:mylogger".into()),
            ]
        );
    }

    #[rstest]
    #[case(Body::Empty)]
    #[case(Body::Text("Goodbye".into()))]
    #[case(Body::Json(serde_json::json!([1, 2, 3])))]
    #[tokio::test]
    async fn it_should_always_emit_the_greeting(#[case] previous: Body) {
        let context = RouteContext::new("test");
        let ids = context.add_routes(&HelloWorldRouter).await.expect("routes");
        let route = context.route(&ids[0]).await.expect("route");
        let mut exchange = Exchange::new(&ids[0], TIMER_URI);
        exchange.message = Message::new(previous);

        let processed = context.process(&route, exchange).await.expect("process");

        assert_eq!(processed.message.body, Body::Text(GREETING.into()));
    }
}
