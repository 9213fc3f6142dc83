use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub workspace: WorkspaceConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding the `workspace-<key>` department folders.
    pub root: String,
    /// Where `scan` writes the snapshot; a `.min.json` sibling is written too.
    pub output: String,
    pub departments: Vec<Department>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            output: "workspace-data.json".to_string(),
            departments: default_departments(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub key: String,
    pub name: String,
}

impl Department {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Front-end assets served for every non-API route.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            static_dir: None,
        }
    }
}

pub fn default_departments() -> Vec<Department> {
    [
        ("content-boss", "Content Creation"),
        ("design-boss", "Design & Visual"),
        ("funnel-boss", "Funnel & Sales"),
        ("ads-boss", "Marketing & Ads"),
        ("reviews-boss", "Reviews & Social Proof"),
        ("seo-boss", "SEO & Search"),
        ("analytics-boss", "Analytics & Data"),
        ("launch-boss", "Launch Operations"),
        ("thingmark-leader", "Leadership"),
        ("operations-boss", "Operations & Infrastructure"),
    ]
    .into_iter()
    .map(|(key, name)| Department::new(key, name))
    .collect()
}

/// Layers `config/default` (or the given file), then `DASHBOARD__*` env vars.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("DASHBOARD")
            .prefix_separator("__")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
