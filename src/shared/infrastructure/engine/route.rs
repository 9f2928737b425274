// Declarative route definitions.
//
// A route is a fixed list of stage descriptors: one source URI followed by processor steps.
// The builder only records descriptors; URIs are resolved when the route is added to a context.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Constant(String),
    Simple(String),
}

pub fn constant(text: impl Into<String>) -> Expression {
    Expression::Constant(text.into())
}

pub fn simple(template: impl Into<String>) -> Expression {
    Expression::Simple(template.into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    SetBody(Expression),
    To(String),
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::SetBody(_) => "setBody",
            Step::To(_) => "to",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub route_id: Option<String>,
    pub from: String,
    pub steps: Vec<Step>,
}

impl RouteDefinition {
    pub fn from(uri: impl Into<String>) -> Self {
        Self {
            route_id: None,
            from: uri.into(),
            steps: Vec::new(),
        }
    }

    pub fn route_id(mut self, id: impl Into<String>) -> Self {
        self.route_id = Some(id.into());
        self
    }

    pub fn set_body(mut self, expression: Expression) -> Self {
        self.steps.push(Step::SetBody(expression));
        self
    }

    pub fn to(mut self, uri: impl Into<String>) -> Self {
        self.steps.push(Step::To(uri.into()));
        self
    }
}

/// Something that contributes route definitions to a context.
pub trait RouteBuilder: Send + Sync {
    fn configure(&self) -> Vec<RouteDefinition>;
}
