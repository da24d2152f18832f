//! Agent directory: turns the configured roster into [`Agent`] records.
//!
//! Missing or invalid entries never abort a game. They are logged and replaced
//! with deterministic defaults:
//! - missing name: the generated agent ID
//! - missing or invalid URL: [`PLACEHOLDER_ENDPOINT`]
//! - missing squad (squad games only): `index / 2`

use std::sync::Arc;

use rand::Rng;
use reqwest::Url;
use tracing::debug;

use crate::agent::{Agent, AgentMetadata, AgentRegistry, GLYPHS};
use crate::config::GameConfig;
use crate::model::{AgentId, GameType};
use crate::obs::{emit_config_warning, emit_probe_failed};
use crate::transport::AgentTransport;

/// Endpoint substituted for missing or unparseable URLs.
pub const PLACEHOLDER_ENDPOINT: &str = "https://example.com";

/// Draw a v4-format UUID from `rng`, so identifiers follow the game seed.
pub fn random_uuid(rng: &mut impl Rng) -> uuid::Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// Parse a configured endpoint. Only absolute `http`/`https` URLs are accepted.
pub fn parse_endpoint(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Some(url),
        _ => None,
    }
}

fn placeholder_endpoint() -> Url {
    Url::parse(PLACEHOLDER_ENDPOINT).expect("placeholder endpoint is a valid URL")
}

/// Resolves configuration into agents and probes each one once.
pub struct AgentDirectory {
    transport: Arc<dyn AgentTransport>,
}

impl AgentDirectory {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self { transport }
    }

    /// Build the registry in configuration order.
    ///
    /// IDs are drawn from `rng`. Probes run one after another, each bounded by
    /// the transport's timeout; a failed probe leaves the API version unknown.
    pub async fn resolve(&self, config: &GameConfig, rng: &mut impl Rng) -> AgentRegistry {
        let names = &config.names;
        let urls = &config.urls;
        let count = names.len().max(urls.len());

        if names.len() != urls.len() {
            emit_config_warning(&format!(
                "number of names ({}) and URLs ({}) do not match: defaults will be applied to missing values",
                names.len(),
                urls.len()
            ));
        }

        let mut agents = Vec::with_capacity(count);
        for i in 0..count {
            let id = AgentId::from(random_uuid(rng));

            let name = match names.get(i) {
                Some(name) => name.clone(),
                None => {
                    emit_config_warning(&format!(
                        "name for URL {} is missing: a default name will be applied",
                        urls[i]
                    ));
                    id.to_string()
                }
            };

            let endpoint = match urls.get(i) {
                Some(raw) => parse_endpoint(raw).unwrap_or_else(|| {
                    emit_config_warning(&format!(
                        "URL {raw} is not valid: a default will be applied"
                    ));
                    placeholder_endpoint()
                }),
                None => {
                    emit_config_warning(&format!(
                        "URL for name {name} is missing: a default URL will be applied"
                    ));
                    placeholder_endpoint()
                }
            };

            let mut agent = Agent::new(id, name, endpoint, GLYPHS[i % GLYPHS.len()]);

            if config.game_type == GameType::Squad {
                agent.squad = match config.squads.get(i) {
                    Some(squad) => squad.clone(),
                    None => {
                        emit_config_warning(&format!(
                            "squad for {} is missing: a default squad will be applied",
                            agent.name
                        ));
                        (i / 2).to_string()
                    }
                };
            }

            self.probe(&mut agent).await;
            agents.push(agent);
        }

        AgentRegistry::new(agents)
    }

    async fn probe(&self, agent: &mut Agent) {
        match self.transport.probe(&agent.endpoint).await {
            Ok(ping) => {
                if !ping.apiversion.is_empty() {
                    agent.api_version = ping.apiversion.clone();
                }
                debug!(agent = %agent.name, api_version = %agent.api_version, "probed agent");
                agent.metadata = Some(AgentMetadata::from(ping));
            }
            Err(err) => emit_probe_failed(agent.endpoint.as_str(), &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::UNKNOWN_API_VERSION;
    use crate::fakes::{AgentScript, ScriptedTransport};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn directory(transport: ScriptedTransport) -> AgentDirectory {
        AgentDirectory::new(Arc::new(transport))
    }

    #[test]
    fn test_parse_endpoint_rejects_relative_and_foreign_schemes() {
        assert!(parse_endpoint("http://localhost:8080").is_some());
        assert!(parse_endpoint(" https://snake.example/api ").is_some());
        assert!(parse_endpoint("localhost:8080").is_none());
        assert!(parse_endpoint("ftp://snake.example").is_none());
        assert!(parse_endpoint("not a url").is_none());
    }

    #[test]
    fn test_random_uuid_follows_seed() {
        let a = random_uuid(&mut StdRng::seed_from_u64(7));
        let b = random_uuid(&mut StdRng::seed_from_u64(7));
        let c = random_uuid(&mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.get_version_num(), 4);
    }

    #[tokio::test]
    async fn test_resolve_probes_and_assigns_glyphs_in_order() {
        let transport = ScriptedTransport::new()
            .with_agent(
                "http://one.test",
                AgentScript::replying(&[]).with_api_version("1"),
            )
            .with_agent("http://two.test", AgentScript::unreachable());
        let config = GameConfig::new(11, 11)
            .with_agent("one", "http://one.test")
            .with_agent("two", "http://two.test");

        let registry = directory(transport)
            .resolve(&config, &mut StdRng::seed_from_u64(1))
            .await;

        let agents: Vec<_> = registry.iter().collect();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].name, "one");
        assert_eq!(agents[0].api_version, "1");
        assert!(agents[0].metadata.is_some());
        assert_eq!(agents[0].glyph, GLYPHS[0]);
        assert_eq!(agents[1].name, "two");
        assert_eq!(agents[1].api_version, UNKNOWN_API_VERSION);
        assert!(agents[1].metadata.is_none());
        assert_eq!(agents[1].glyph, GLYPHS[1]);
    }

    #[tokio::test]
    async fn test_resolve_fills_missing_entries() {
        let mut config = GameConfig::new(11, 11)
            .with_agent("one", "http://one.test")
            .with_agent("two", "http://two.test");
        config.names.push("three".to_string());

        let registry = directory(ScriptedTransport::new())
            .resolve(&config, &mut StdRng::seed_from_u64(1))
            .await;
        let agents: Vec<_> = registry.iter().collect();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[2].name, "three");
        assert_eq!(agents[2].endpoint.as_str(), "https://example.com/");

        let mut config = GameConfig::new(11, 11).with_agent("one", "http://one.test");
        config.urls.push("http://nameless.test".to_string());

        let registry = directory(ScriptedTransport::new())
            .resolve(&config, &mut StdRng::seed_from_u64(1))
            .await;
        let agents: Vec<_> = registry.iter().collect();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[1].name, agents[1].id.to_string());
        assert_eq!(agents[1].endpoint.as_str(), "http://nameless.test/");
    }

    #[tokio::test]
    async fn test_invalid_url_gets_placeholder() {
        let config = GameConfig::new(11, 11).with_agent("bad", "::not-a-url::");
        let registry = directory(ScriptedTransport::new())
            .resolve(&config, &mut StdRng::seed_from_u64(3))
            .await;
        let agent = registry.iter().next().unwrap();
        assert_eq!(agent.endpoint.host_str(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_squad_defaults_pair_agents() {
        let mut config = GameConfig::new(11, 11)
            .with_game_type(GameType::Squad)
            .with_squad_agent("a", "http://a.test", "red");
        for name in ["b", "c", "d"] {
            config = config.with_agent(name, &format!("http://{name}.test"));
        }

        let registry = directory(ScriptedTransport::new())
            .resolve(&config, &mut StdRng::seed_from_u64(5))
            .await;
        let squads: Vec<_> = registry.iter().map(|a| a.squad.as_str()).collect();
        assert_eq!(squads, vec!["red", "0", "1", "1"]);
    }

    #[tokio::test]
    async fn test_squads_ignored_outside_squad_games() {
        let config = GameConfig::new(11, 11).with_squad_agent("a", "http://a.test", "red");
        let registry = directory(ScriptedTransport::new())
            .resolve(&config, &mut StdRng::seed_from_u64(5))
            .await;
        assert!(registry.iter().all(|a| a.squad.is_empty()));
    }
}
