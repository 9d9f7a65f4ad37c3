//! Response synthesis via a live call.
//!
//! The last-resort response strategy: builds a synthetic request from the
//! accumulated parameter context and the rule-set, dispatches it through the
//! host execution environment, and records the status and body that come
//! back. Every call runs inside a transaction that is rolled back on all exit
//! paths, so a synthesized call never leaves persistent side effects.

use super::{StageOutput, Strategy, StrategyInput};
use crate::adapter::{ExecutionEnvironment, SyntheticRequest};
use crate::extractor::ResponseSpec;
use crate::params::clean_parameters;
use anyhow::Result;
use log::debug;
use std::rc::Rc;

pub struct ResponseCallRunner {
    pub environment: Rc<dyn ExecutionEnvironment>,
}

impl Strategy for ResponseCallRunner {
    fn name(&self) -> &'static str {
        "responses.call"
    }

    fn invoke(&self, input: &StrategyInput) -> Result<Option<StageOutput>> {
        let call_rules = &input.rules.response_calls;
        let method = input.route.main_method();

        if !call_rules.allows_method(&method) {
            debug!(
                "Response calls not allowed for {} {}, skipping",
                method, input.route.uri
            );
            return Ok(None);
        }
        if input
            .context
            .responses
            .iter()
            .any(|r| (200..300).contains(&r.status))
        {
            debug!(
                "A successful response already exists for {}, skipping call",
                input.route.signature()
            );
            return Ok(None);
        }

        debug!("Making response call for {}", input.route.signature());
        self.environment.begin_transaction()?;
        let result = self.dispatch_call(input, &method);
        // Cleanup runs on success and on error alike
        self.environment.restore_overrides();
        self.environment.rollback_transaction();

        let response = result?;
        Ok(Some(StageOutput::Responses(vec![response])))
    }
}

impl ResponseCallRunner {
    fn dispatch_call(&self, input: &StrategyInput, method: &str) -> Result<ResponseSpec> {
        let call_rules = &input.rules.response_calls;
        self.environment
            .apply_overrides(&call_rules.config, &call_rules.env)?;

        let mut query = clean_parameters(&input.context.query_parameters);
        for (key, value) in &call_rules.query {
            query.insert(key.clone(), value.clone());
        }
        let mut body = clean_parameters(&input.context.body_parameters);
        for (key, value) in &call_rules.body {
            body.insert(key.clone(), value.clone());
        }
        let mut headers = input.context.headers.clone();
        for (key, value) in &call_rules.headers {
            headers.insert(key.clone(), value.clone());
        }

        let request = SyntheticRequest {
            method: method.to_string(),
            uri: input.route.bound_uri(call_rules),
            headers,
            cookies: call_rules.cookies.clone(),
            query,
            body,
        };

        let response = self.environment.dispatch(&request)?;
        Ok(ResponseSpec {
            status: response.status,
            content: response.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::KernelResponse;
    use crate::annotations::DocBlock;
    use crate::config::{ResponseCallRules, RuleSet};
    use crate::extractor::ExtractionContext;
    use crate::params::ParameterSpec;
    use crate::route::{HandlerMeta, RouteRecord};
    use crate::strategies::test_support::input_for;
    use anyhow::bail;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Recording {
        began: bool,
        rolled_back: bool,
        overrides_applied: bool,
        overrides_restored: bool,
        dispatched: Vec<SyntheticRequest>,
    }

    struct RecordingEnvironment {
        state: RefCell<Recording>,
        response: std::result::Result<KernelResponse, String>,
    }

    impl RecordingEnvironment {
        fn ok(status: u16, body: &str) -> Self {
            Self {
                state: RefCell::new(Recording::default()),
                response: Ok(KernelResponse {
                    status,
                    body: body.to_string(),
                }),
            }
        }

        fn failing() -> Self {
            Self {
                state: RefCell::new(Recording::default()),
                response: Err("connection refused".to_string()),
            }
        }
    }

    impl ExecutionEnvironment for RecordingEnvironment {
        fn begin_transaction(&self) -> Result<()> {
            self.state.borrow_mut().began = true;
            Ok(())
        }

        fn rollback_transaction(&self) {
            self.state.borrow_mut().rolled_back = true;
        }

        fn apply_overrides(
            &self,
            _config: &BTreeMap<String, String>,
            _env: &BTreeMap<String, String>,
        ) -> Result<()> {
            self.state.borrow_mut().overrides_applied = true;
            Ok(())
        }

        fn restore_overrides(&self) {
            self.state.borrow_mut().overrides_restored = true;
        }

        fn dispatch(&self, request: &SyntheticRequest) -> Result<KernelResponse> {
            self.state.borrow_mut().dispatched.push(request.clone());
            match &self.response {
                Ok(response) => Ok(response.clone()),
                Err(message) => bail!("{}", message),
            }
        }
    }

    fn route() -> RouteRecord {
        RouteRecord {
            methods: vec!["GET".to_string(), "HEAD".to_string()],
            uri: "api/users/{id}/posts/{post?}".to_string(),
            domain: None,
            name: String::new(),
            versions: Vec::new(),
            handler: HandlerMeta {
                class_name: "PostController".to_string(),
                method_name: "show".to_string(),
                ..HandlerMeta::default()
            },
        }
    }

    fn rules_allowing(methods: &[&str]) -> RuleSet {
        RuleSet {
            response_calls: ResponseCallRules {
                methods: methods.iter().map(|m| m.to_string()).collect(),
                ..ResponseCallRules::default()
            },
            ..RuleSet::default()
        }
    }

    #[test]
    fn test_skipped_when_method_not_allowed() {
        let env = Rc::new(RecordingEnvironment::ok(200, "{}"));
        let runner = ResponseCallRunner {
            environment: env.clone(),
        };
        let route = route();
        let doc = DocBlock::default();
        let rules = rules_allowing(&["POST"]);
        let ctx = ExtractionContext::default();
        let input = input_for(&route, &doc, &doc, &rules, &ctx);

        assert!(runner.invoke(&input).expect("invoke").is_none());
        assert!(env.state.borrow().dispatched.is_empty());
        assert!(!env.state.borrow().began);
    }

    #[test]
    fn test_skipped_when_prior_success_exists() {
        let env = Rc::new(RecordingEnvironment::ok(200, "{}"));
        let runner = ResponseCallRunner {
            environment: env.clone(),
        };
        let route = route();
        let doc = DocBlock::default();
        let rules = rules_allowing(&["*"]);
        let mut ctx = ExtractionContext::default();
        ctx.responses.push(ResponseSpec {
            status: 201,
            content: "{}".to_string(),
        });
        let input = input_for(&route, &doc, &doc, &rules, &ctx);

        assert!(runner.invoke(&input).expect("invoke").is_none());
        assert!(env.state.borrow().dispatched.is_empty());
    }

    #[test]
    fn test_not_skipped_by_prior_error_response() {
        let env = Rc::new(RecordingEnvironment::ok(200, "{\"ok\":true}"));
        let runner = ResponseCallRunner {
            environment: env.clone(),
        };
        let route = route();
        let doc = DocBlock::default();
        let rules = rules_allowing(&["GET"]);
        let mut ctx = ExtractionContext::default();
        ctx.responses.push(ResponseSpec {
            status: 404,
            content: "{}".to_string(),
        });
        let input = input_for(&route, &doc, &doc, &rules, &ctx);

        let output = runner.invoke(&input).expect("invoke").expect("response");
        match output {
            StageOutput::Responses(responses) => {
                assert_eq!(responses[0].status, 200);
                assert_eq!(responses[0].content, "{\"ok\":true}");
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_request_shape_and_cleanup() {
        let env = Rc::new(RecordingEnvironment::ok(200, "{}"));
        let runner = ResponseCallRunner {
            environment: env.clone(),
        };
        let route = route();
        let doc = DocBlock::default();
        let mut rules = rules_allowing(&["GET"]);
        rules
            .response_calls
            .bindings
            .insert("{id}".to_string(), "42".to_string());
        rules
            .response_calls
            .query
            .insert("page".to_string(), json!(3));
        let mut ctx = ExtractionContext::default();
        ctx.query_parameters.insert(
            "page".to_string(),
            ParameterSpec {
                kind: "integer".to_string(),
                value: Some(json!(1)),
                ..ParameterSpec::default()
            },
        );
        ctx.query_parameters.insert(
            "filter".to_string(),
            ParameterSpec {
                kind: "string".to_string(),
                value: Some(json!("active")),
                ..ParameterSpec::default()
            },
        );
        ctx.headers
            .insert("Authorization".to_string(), "Bearer x".to_string());
        let input = input_for(&route, &doc, &doc, &rules, &ctx);

        runner.invoke(&input).expect("invoke").expect("response");

        let state = env.state.borrow();
        assert!(state.began);
        assert!(state.rolled_back);
        assert!(state.overrides_applied);
        assert!(state.overrides_restored);
        let request = &state.dispatched[0];
        // Bound placeholder from bindings, unbound optional defaults to 1
        assert_eq!(request.uri, "api/users/42/posts/1");
        // Rule-set query value wins over the generated one
        assert_eq!(request.query["page"], json!(3));
        assert_eq!(request.query["filter"], json!("active"));
        assert_eq!(request.headers["Authorization"], "Bearer x");
    }

    #[test]
    fn test_dispatch_failure_still_rolls_back() {
        let env = Rc::new(RecordingEnvironment::failing());
        let runner = ResponseCallRunner {
            environment: env.clone(),
        };
        let route = route();
        let doc = DocBlock::default();
        let rules = rules_allowing(&["*"]);
        let ctx = ExtractionContext::default();
        let input = input_for(&route, &doc, &doc, &rules, &ctx);

        assert!(runner.invoke(&input).is_err());
        let state = env.state.borrow();
        assert!(state.began);
        assert!(state.rolled_back);
        assert!(state.overrides_restored);
    }
}
