use crate::{
    apps::{ApplicationRef, ApplicationSet},
    core::{AgentConfig, agent::Agent},
    error::ConfigError,
    provider::ProviderRef,
};

/// Builder for constructing an [`Agent`].
///
/// Everything that can be wrong with an agent is checked in [`build`](Self::build), so a
/// misconfigured process fails at startup instead of inside the loop.
pub struct AgentBuilder {
    provider: ProviderRef,
    cfg: AgentConfig,
    apps: Vec<ApplicationRef>,
}

impl AgentBuilder {
    /// Creates a builder with the default configuration and no applications.
    pub fn new(provider: ProviderRef) -> Self {
        Self {
            provider,
            cfg: AgentConfig::default(),
            apps: Vec::new(),
        }
    }

    /// Registers one application; dispatch follows registration order.
    pub fn with_application(mut self, app: ApplicationRef) -> Self {
        self.apps.push(app);
        self
    }

    /// Registers several applications, appended in iteration order.
    pub fn with_applications(mut self, apps: impl IntoIterator<Item = ApplicationRef>) -> Self {
        self.apps.extend(apps);
        self
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: AgentConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Validates the configuration and freezes the application set.
    ///
    /// ### Errors
    /// Any [`ConfigError`]: zero interval, no applications, empty or duplicate names.
    pub fn build(self) -> Result<Agent, ConfigError> {
        self.cfg.validate()?;
        let apps = ApplicationSet::new(self.apps)?;

        Ok(Agent {
            provider: self.provider,
            apps,
            cfg: self.cfg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::apps::Application;
    use crate::error::ApplicationError;
    use crate::events::Event;
    use crate::provider::{MemoryProvider, Provider};

    struct Named(&'static str);

    #[async_trait]
    impl Application for Named {
        fn name(&self) -> &str {
            self.0
        }
        async fn join(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
            Ok(())
        }
        async fn launch(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
            Ok(())
        }
        async fn terminate(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
            Ok(())
        }
    }

    fn builder() -> AgentBuilder {
        AgentBuilder::new(Arc::new(MemoryProvider::new("i-local")))
    }

    #[test]
    fn test_build_keeps_registration_order() {
        let agent = builder()
            .with_application(Arc::new(Named("consul")))
            .with_applications([
                Arc::new(Named("nomad")) as ApplicationRef,
                Arc::new(Named("vault")) as ApplicationRef,
            ])
            .build()
            .unwrap();
        assert_eq!(agent.applications().names(), vec!["consul", "nomad", "vault"]);
        assert_eq!(agent.provider().name(), "memory");
    }

    #[test]
    fn test_build_fails_fast() {
        assert_eq!(builder().build().err(), Some(ConfigError::NoApplications));

        let zero = AgentConfig {
            interval: Duration::ZERO,
            ..AgentConfig::default()
        };
        assert_eq!(
            builder()
                .with_application(Arc::new(Named("consul")))
                .with_config(zero)
                .build()
                .err(),
            Some(ConfigError::ZeroInterval)
        );

        assert_eq!(
            builder()
                .with_application(Arc::new(Named("consul")))
                .with_application(Arc::new(Named("consul")))
                .build()
                .err(),
            Some(ConfigError::DuplicateApplication {
                name: "consul".into()
            })
        );
    }
}
