// Agent registry and dispatch
//
// Design decisions:
// - The registry is an explicit, dependency-injected instance; there is no
//   global. Hosts build one at startup and share it behind `Arc`
// - Registration is the only fallible phase: id shape, per-agent tool-name
//   uniqueness, and schema invariants are all checked up front, so dispatch
//   can index without re-validating
// - Duplicate agent ids are rejected with an error, not silently replaced
// - `accessible` recomputes the capability check on every call; caller
//   capabilities change between requests and must never be memoized here
// - Agents keep insertion order; `first()` is the stable default agent

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::agent::{Agent, AgentDescriptor};
use crate::capability::CapabilitySet;
use crate::context::HostContext;
use crate::error::RegistryError;
use crate::outcome::DispatchOutcome;
use crate::schema::ToolSchema;
use crate::tool::Tool;

// ============================================================================
// Registered agent
// ============================================================================

/// An agent after successful registration.
///
/// Tools and their validated schemas are captured once here; the maps below
/// are what dispatch indexes into, so an agent's behavior cannot drift from
/// what was registered.
pub struct RegisteredAgent {
    agent: Arc<dyn Agent>,
    tools: Vec<Arc<dyn Tool>>,
    schemas: Vec<ToolSchema>,
    by_name: HashMap<String, usize>,
    required: CapabilitySet,
}

impl RegisteredAgent {
    fn new(agent: Arc<dyn Agent>) -> Result<Self, RegistryError> {
        let id = agent.id().to_string();
        if !valid_agent_id(&id) {
            return Err(RegistryError::InvalidAgentId(id));
        }

        let tools = agent.tools();
        let mut schemas = Vec::with_capacity(tools.len());
        let mut by_name = HashMap::with_capacity(tools.len());
        for (idx, tool) in tools.iter().enumerate() {
            let schema = tool.schema();
            if let Err(source) = schema.validate() {
                return Err(RegistryError::InvalidSchema {
                    agent: id,
                    tool: schema.name().to_string(),
                    source,
                });
            }
            if by_name.insert(schema.name().to_string(), idx).is_some() {
                return Err(RegistryError::DuplicateTool {
                    agent: id,
                    tool: schema.name().to_string(),
                });
            }
            schemas.push(schema);
        }

        let required = agent.required_capabilities();
        Ok(Self {
            agent,
            tools,
            schemas,
            by_name,
            required,
        })
    }

    pub fn id(&self) -> &str {
        self.agent.id()
    }

    /// The underlying agent definition
    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    /// Capabilities a caller must hold to use this agent
    pub fn required_capabilities(&self) -> &CapabilitySet {
        &self.required
    }

    /// Validated tool schemas, in the agent's declared order
    pub fn tool_schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    /// Rendered wire definitions of the agent's tools, in declared order
    pub fn tool_definitions(&self) -> Vec<Value> {
        self.schemas
            .iter()
            .map(ToolSchema::to_definition_value)
            .collect()
    }

    /// True if this agent owns a tool with the given name
    pub fn owns(&self, tool_name: &str) -> bool {
        self.by_name.contains_key(tool_name)
    }

    /// Presentation snapshot of this agent
    pub fn descriptor(&self) -> AgentDescriptor {
        AgentDescriptor {
            id: self.agent.id().to_string(),
            name: self.agent.name().to_string(),
            description: self.agent.description().to_string(),
            icon: self.agent.icon().to_string(),
            category: self.agent.category().to_string(),
            version: self.agent.version().to_string(),
            author: self.agent.author().to_string(),
            required_capabilities: self.required.clone(),
            welcome_message: self.agent.welcome_message(),
            suggested_prompts: self.agent.suggested_prompts(),
            tools: self.tool_definitions(),
        }
    }

    /// Dispatch one tool call against this agent.
    ///
    /// Order per call: tool-name lookup (miss is `NotOwned`), then the
    /// agent's `ensure_ready` precondition, then schema validation, then the
    /// handler. Every failure after the lookup is in-band; this method never
    /// returns an `Err` and never panics on caller input.
    pub async fn dispatch(
        &self,
        tool_name: &str,
        arguments: &Value,
        host: &HostContext,
    ) -> DispatchOutcome {
        let Some(&idx) = self.by_name.get(tool_name) else {
            return DispatchOutcome::NotOwned;
        };

        tracing::debug!(
            agent = self.agent.id(),
            tool = tool_name,
            request_id = %host.request_id,
            "Dispatching tool call"
        );

        if let Err(message) = self.agent.ensure_ready(host).await {
            return DispatchOutcome::Failure(message);
        }

        let args = match self.schemas[idx].check_args(arguments) {
            Ok(args) => args,
            Err(message) => return DispatchOutcome::Failure(message),
        };

        self.tools[idx]
            .execute(args, host)
            .await
            .into_dispatch(self.agent.id(), tool_name)
    }
}

impl std::fmt::Debug for RegisteredAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredAgent")
            .field("id", &self.agent.id())
            .field("tools", &self.by_name.keys().collect::<Vec<_>>())
            .field("required", &self.required)
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered collection of registered agents, keyed by id.
///
/// Built once at startup (directly or via [`AgentRegistryBuilder`]) and then
/// only read; share it behind `Arc` across concurrent callers.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<RegisteredAgent>,
    by_id: HashMap<String, usize>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::default()
    }

    /// Register an agent, validating its id, tool names, and schemas.
    ///
    /// A duplicate id is an error; the existing registration stays in place.
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<(), RegistryError> {
        let registered = RegisteredAgent::new(agent)?;
        let id = registered.id().to_string();
        if self.by_id.contains_key(&id) {
            return Err(RegistryError::DuplicateAgent(id));
        }
        self.by_id.insert(id, self.agents.len());
        self.agents.push(registered);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredAgent> {
        self.by_id.get(id).map(|&idx| &self.agents[idx])
    }

    pub fn has(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All agents, in registration order
    pub fn agents(&self) -> impl Iterator<Item = &RegisteredAgent> {
        self.agents.iter()
    }

    /// The first registered agent; the stable default for hosts that need one
    pub fn first(&self) -> Option<&RegisteredAgent> {
        self.agents.first()
    }

    /// Agent ids in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id()).collect()
    }

    /// Agents whose required capabilities are all held by the caller.
    ///
    /// Recomputed on every call; the result order is registration order.
    pub fn accessible(&self, caller: &CapabilitySet) -> Vec<&RegisteredAgent> {
        self.agents
            .iter()
            .filter(|a| caller.contains_all(&a.required))
            .collect()
    }

    /// Presentation snapshots of every agent, in registration order
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.agents.iter().map(|a| a.descriptor()).collect()
    }

    /// Offer a tool call to every agent in registration order.
    ///
    /// The first agent that owns the tool name handles it; the result pairs
    /// the owner's id with its outcome. `None` means no agent owns the name.
    pub async fn route(
        &self,
        tool_name: &str,
        arguments: &Value,
        host: &HostContext,
    ) -> Option<(&str, DispatchOutcome)> {
        for agent in &self.agents {
            match agent.dispatch(tool_name, arguments, host).await {
                DispatchOutcome::NotOwned => continue,
                outcome => return Some((agent.id(), outcome)),
            }
        }
        None
    }
}

/// Fluent construction for [`AgentRegistry`].
///
/// Agents are queued unvalidated; `build` registers them in order and
/// surfaces the first registration error.
#[derive(Default)]
pub struct AgentRegistryBuilder {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRegistryBuilder {
    pub fn agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn build(self) -> Result<AgentRegistry, RegistryError> {
        let mut registry = AgentRegistry::new();
        for agent in self.agents {
            registry.register(agent)?;
        }
        Ok(registry)
    }
}

fn valid_agent_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::outcome::ToolOutcome;
    use crate::schema::{ParamKind, ParamSpec, ToolArguments};
    use async_trait::async_trait;
    use serde_json::json;

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("ping", "Reply with pong")
                .param(ParamSpec::required("message", ParamKind::String, "Echoed back"))
        }

        async fn execute(&self, args: ToolArguments, _host: &HostContext) -> ToolOutcome {
            match args.str("message") {
                Some(message) => ToolOutcome::success(json!({ "pong": message })),
                None => ToolOutcome::failure("Missing required parameter: message"),
            }
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::new("broken", "Always fails internally")
        }

        async fn execute(&self, _args: ToolArguments, _host: &HostContext) -> ToolOutcome {
            ToolOutcome::internal_msg("connection pool exhausted (host=10.0.0.3)")
        }
    }

    struct TestAgent {
        id: String,
        capability: Capability,
        ready: bool,
    }

    impl TestAgent {
        fn new(id: &str, capability: Capability) -> Self {
            Self {
                id: id.to_string(),
                capability,
                ready: true,
            }
        }

        fn not_ready(mut self) -> Self {
            self.ready = false;
            self
        }
    }

    #[async_trait]
    impl Agent for TestAgent {
        fn id(&self) -> &str {
            &self.id
        }

        fn name(&self) -> &str {
            "Test Agent"
        }

        fn description(&self) -> &str {
            "Agent used in registry tests"
        }

        fn system_prompt(&self) -> &str {
            "You are a test agent."
        }

        fn required_capabilities(&self) -> CapabilitySet {
            CapabilitySet::of([self.capability.clone()])
        }

        fn tools(&self) -> Vec<Arc<dyn Tool>> {
            vec![Arc::new(PingTool), Arc::new(BrokenTool)]
        }

        async fn ensure_ready(&self, _host: &HostContext) -> Result<(), String> {
            if self.ready {
                Ok(())
            } else {
                Err("The ping backend is not active".to_string())
            }
        }
    }

    fn registry_with(agents: Vec<Arc<dyn Agent>>) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        for agent in agents {
            registry.register(agent).unwrap();
        }
        registry
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = registry_with(vec![
            Arc::new(TestAgent::new("alpha", Capability::edit_content())),
            Arc::new(TestAgent::new("beta", Capability::manage_users())),
        ]);

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert!(registry.has("alpha"));
        assert!(!registry.has("gamma"));
        assert_eq!(registry.ids(), vec!["alpha", "beta"]);
        assert_eq!(registry.first().map(|a| a.id()), Some("alpha"));
        assert!(registry.get("beta").is_some());
        assert!(registry.get("gamma").is_none());
    }

    #[test]
    fn test_duplicate_id_is_rejected_and_original_kept() {
        let mut registry = AgentRegistry::new();
        registry
            .register(Arc::new(TestAgent::new("alpha", Capability::edit_content())))
            .unwrap();

        let err = registry
            .register(Arc::new(TestAgent::new("alpha", Capability::manage_users())))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAgent(id) if id == "alpha"));

        assert_eq!(registry.len(), 1);
        let kept = registry.get("alpha").unwrap();
        assert!(kept
            .required_capabilities()
            .contains(&Capability::edit_content()));
    }

    #[test]
    fn test_invalid_id_shapes_are_rejected() {
        for id in ["", "Has-Upper", "with space", "uses_underscore"] {
            let mut registry = AgentRegistry::new();
            let agent = TestAgent::new(id, Capability::edit_content());
            let err = registry.register(Arc::new(agent)).unwrap_err();
            assert!(
                matches!(err, RegistryError::InvalidAgentId(_)),
                "id {id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_duplicate_tool_name_is_rejected() {
        struct DoubledAgent;

        #[async_trait]
        impl Agent for DoubledAgent {
            fn id(&self) -> &str {
                "doubled"
            }
            fn name(&self) -> &str {
                "Doubled"
            }
            fn description(&self) -> &str {
                "Has two tools with the same name"
            }
            fn system_prompt(&self) -> &str {
                "prompt"
            }
            fn required_capabilities(&self) -> CapabilitySet {
                CapabilitySet::new()
            }
            fn tools(&self) -> Vec<Arc<dyn Tool>> {
                vec![Arc::new(PingTool), Arc::new(PingTool)]
            }
        }

        let mut registry = AgentRegistry::new();
        let err = registry.register(Arc::new(DoubledAgent)).unwrap_err();
        assert!(
            matches!(err, RegistryError::DuplicateTool { agent, tool }
                if agent == "doubled" && tool == "ping")
        );
    }

    #[test]
    fn test_invalid_schema_is_rejected_at_registration() {
        struct NamelessTool;

        #[async_trait]
        impl Tool for NamelessTool {
            fn schema(&self) -> ToolSchema {
                ToolSchema::new("", "No name")
            }
            async fn execute(&self, _args: ToolArguments, _host: &HostContext) -> ToolOutcome {
                ToolOutcome::success(json!(null))
            }
        }

        struct BadSchemaAgent;

        #[async_trait]
        impl Agent for BadSchemaAgent {
            fn id(&self) -> &str {
                "bad-schema"
            }
            fn name(&self) -> &str {
                "Bad"
            }
            fn description(&self) -> &str {
                "Carries an invalid schema"
            }
            fn system_prompt(&self) -> &str {
                "prompt"
            }
            fn required_capabilities(&self) -> CapabilitySet {
                CapabilitySet::new()
            }
            fn tools(&self) -> Vec<Arc<dyn Tool>> {
                vec![Arc::new(NamelessTool)]
            }
        }

        let mut registry = AgentRegistry::new();
        let err = registry.register(Arc::new(BadSchemaAgent)).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn test_accessible_is_monotonic() {
        let registry = registry_with(vec![
            Arc::new(TestAgent::new("alpha", Capability::edit_content())),
            Arc::new(TestAgent::new("beta", Capability::manage_users())),
            Arc::new(TestAgent::new("gamma", Capability::edit_content())),
        ]);

        let none = CapabilitySet::new();
        assert!(registry.accessible(&none).is_empty());

        let editor = CapabilitySet::of([Capability::edit_content()]);
        let ids: Vec<&str> = registry.accessible(&editor).iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["alpha", "gamma"]);

        // Widening the caller set never removes agents
        let admin = editor.clone().with(Capability::manage_users());
        let ids: Vec<&str> = registry.accessible(&admin).iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_not_owned() {
        let registry = registry_with(vec![Arc::new(TestAgent::new(
            "alpha",
            Capability::edit_content(),
        ))]);
        let host = HostContext::new();

        let outcome = registry
            .get("alpha")
            .unwrap()
            .dispatch("no_such_tool", &json!({}), &host)
            .await;
        assert_eq!(outcome, DispatchOutcome::NotOwned);
        assert_eq!(outcome.into_value(), None);
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let registry = registry_with(vec![Arc::new(TestAgent::new(
            "alpha",
            Capability::edit_content(),
        ))]);
        let host = HostContext::new();

        let outcome = registry
            .get("alpha")
            .unwrap()
            .dispatch("ping", &json!({ "message": "hi" }), &host)
            .await;
        assert_eq!(outcome, DispatchOutcome::Success(json!({ "pong": "hi" })));
    }

    #[tokio::test]
    async fn test_dispatch_validation_failure_is_in_band() {
        let registry = registry_with(vec![Arc::new(TestAgent::new(
            "alpha",
            Capability::edit_content(),
        ))]);
        let host = HostContext::new();

        let outcome = registry
            .get("alpha")
            .unwrap()
            .dispatch("ping", &json!({}), &host)
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Failure("Missing required parameter: message".to_string())
        );
        assert_eq!(
            outcome.into_value(),
            Some(json!({ "error": "Missing required parameter: message" }))
        );
    }

    #[tokio::test]
    async fn test_dispatch_precondition_short_circuits_every_tool() {
        let registry = registry_with(vec![Arc::new(
            TestAgent::new("alpha", Capability::edit_content()).not_ready(),
        )]);
        let host = HostContext::new();
        let agent = registry.get("alpha").unwrap();

        // Valid and invalid argument payloads fail identically: the
        // precondition runs before validation
        for args in [json!({ "message": "hi" }), json!({})] {
            let outcome = agent.dispatch("ping", &args, &host).await;
            assert_eq!(
                outcome,
                DispatchOutcome::Failure("The ping backend is not active".to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_dispatch_masks_internal_errors() {
        let registry = registry_with(vec![Arc::new(TestAgent::new(
            "alpha",
            Capability::edit_content(),
        ))]);
        let host = HostContext::new();

        let outcome = registry
            .get("alpha")
            .unwrap()
            .dispatch("broken", &json!({}), &host)
            .await;
        assert_eq!(
            outcome,
            DispatchOutcome::Failure(
                "An internal error occurred while executing the tool".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_route_finds_first_owner() {
        let registry = registry_with(vec![
            Arc::new(TestAgent::new("alpha", Capability::edit_content())),
            Arc::new(TestAgent::new("beta", Capability::manage_users())),
        ]);
        let host = HostContext::new();

        let (owner, outcome) = registry
            .route("ping", &json!({ "message": "x" }), &host)
            .await
            .unwrap();
        assert_eq!(owner, "alpha");
        assert!(outcome.is_success());

        assert!(registry.route("missing", &json!({}), &host).await.is_none());
    }

    #[test]
    fn test_builder_registers_in_order() {
        let registry = AgentRegistry::builder()
            .agent(Arc::new(TestAgent::new("alpha", Capability::edit_content())))
            .agent(Arc::new(TestAgent::new("beta", Capability::manage_users())))
            .build()
            .unwrap();
        assert_eq!(registry.ids(), vec!["alpha", "beta"]);

        let err = AgentRegistry::builder()
            .agent(Arc::new(TestAgent::new("alpha", Capability::edit_content())))
            .agent(Arc::new(TestAgent::new("alpha", Capability::edit_content())))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAgent(_)));
    }

    #[test]
    fn test_descriptor_carries_tool_definitions() {
        let registry = registry_with(vec![Arc::new(TestAgent::new(
            "alpha",
            Capability::edit_content(),
        ))]);

        let descriptor = registry.get("alpha").unwrap().descriptor();
        assert_eq!(descriptor.id, "alpha");
        assert_eq!(descriptor.tools.len(), 2);
        assert_eq!(descriptor.tools[0]["name"], "ping");
        assert_eq!(
            descriptor.tools[0]["parameters"]["additionalProperties"],
            json!(false)
        );
    }
}
