use serde::Deserialize;

/// Main configuration structure for Driftnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spider: SpiderConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub seeds: Vec<String>,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// Spider behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpiderConfig {
    /// Maximum number of concurrently running requests (0 = unbounded)
    #[serde(default)]
    pub concurrency: usize,

    /// Maximum crawl duration in seconds (0 = unbounded)
    #[serde(rename = "lifetime-secs", default)]
    pub lifetime_secs: u64,

    /// Times a request whose fetch failed is resubmitted (0 = never)
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub name: String,

    /// Version of the crawler
    pub version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!("{}/{} (+{})", self.name, self.version, contact),
            None => format!("{}/{}", self.name, self.version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// What to extract from fetched pages
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// CSS selector for item elements
    pub selector: String,

    /// Attribute to extract instead of the element text
    #[serde(default)]
    pub attribute: Option<String>,

    /// CSS selector for links to follow
    #[serde(default)]
    pub follow: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Print items to stdout
    #[serde(default)]
    pub console: bool,

    /// Append items to this file
    #[serde(default)]
    pub file: Option<String>,

    /// Store items in this SQLite database
    #[serde(default)]
    pub database: Option<String>,
}

impl OutputConfig {
    /// Number of outputs enabled
    pub fn count(&self) -> usize {
        usize::from(self.console)
            + usize::from(self.file.is_some())
            + usize::from(self.database.is_some())
    }
}
