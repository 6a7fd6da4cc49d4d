use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub wiki: WikiConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WikiConfig {
    /// Endpoint of the wiki's action API, e.g. `https://wiki.example.org/api.php`.
    pub api_url: String,
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[wiki]
api_url = "https://wiki.example.org/api.php"
user_agent = "wikitunes/0.1"
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.wiki.api_url, "https://wiki.example.org/api.php");
        assert_eq!(cfg.wiki.user_agent.as_deref(), Some("wikitunes/0.1"));

        Ok(())
    }

    #[test]
    fn test_user_agent_optional() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[wiki]
api_url = "https://wiki.example.org/api.php"
"#;

        let cfg: Config = toml::from_str(toml_str)?;
        assert!(cfg.wiki.user_agent.is_none());

        Ok(())
    }
}
