//! Indexer configuration.
//!
//! Loaded from a TOML file. Values may reference environment variables with
//! `${VAR_NAME}` placeholders, which are expanded before parsing; secrets
//! like RPC keys stay out of the file itself.

use alloy::primitives::Address;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chain connection.
    pub network: NetworkConfig,

    /// Registry contract addresses.
    pub contracts: ContractsConfig,

    /// Database connection and pool.
    pub database: DatabaseConfig,

    /// Sync cursor and polling.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Log level and format, applied by deployment tooling.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chain connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Ethereum JSON-RPC endpoint.
    pub rpc_url: String,

    /// Chain id the cursor is keyed by (e.g. 11155111 for Sepolia).
    pub chain_id: u64,
}

/// Addresses of the five registry contracts the indexer watches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// DID registry (DIDCreated, RecoveryExecuted).
    pub did_registry: Address,

    /// Schema registry (SchemaRegistered).
    pub schema_registry: Address,

    /// Attestation registry (AttestationIssued, AttestationRevoked).
    pub attestation_registry: Address,

    /// Delegation registry (DelegationCreated, DelegationRevoked).
    pub delegation_registry: Address,

    /// Revocation registry (CredentialRevoked).
    pub revocation_registry: Address,
}

/// Database connection and pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (e.g. "sqlite://agenttrust.db").
    pub url: String,

    /// Connection pool upper bound.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection pool lower bound.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Sync cursor seeding and polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Block the cursor is seeded at for a fresh database; the first
    /// fetched block is `start_block + 1`. Ignored once a cursor exists.
    #[serde(default)]
    pub start_block: u64,

    /// Seconds to sleep between polls while at the chain head.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Upper bound on blocks fetched per tick.
    #[serde(default = "default_max_blocks_per_run")]
    pub max_blocks_per_run: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            poll_interval_secs: default_poll_interval_secs(),
            max_blocks_per_run: default_max_blocks_per_run(),
        }
    }
}

/// Log level and format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "json" or "pretty".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_poll_interval_secs() -> u64 {
    12
}

fn default_max_blocks_per_run() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load and validate configuration from a TOML file.
    ///
    /// `${VAR_NAME}` placeholders are replaced with the named environment
    /// variable before parsing, e.g. `rpc_url = "${RPC_URL}"`.
    ///
    /// # Example
    /// ```no_run
    /// # use agenttrust_indexer::config::Config;
    /// let config = Config::from_file("indexer.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = expand_env_vars(&contents)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load and validate configuration from a TOML string. Placeholders are
    /// not expanded.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.network.rpc_url.is_empty(), "Network RPC URL cannot be empty");
        ensure!(self.network.chain_id != 0, "Chain ID must be non-zero");

        let registries = [
            ("did_registry", &self.contracts.did_registry),
            ("schema_registry", &self.contracts.schema_registry),
            ("attestation_registry", &self.contracts.attestation_registry),
            ("delegation_registry", &self.contracts.delegation_registry),
            ("revocation_registry", &self.contracts.revocation_registry),
        ];
        for (name, address) in registries {
            ensure!(
                !address.is_zero(),
                "Contracts {} must be a non-zero address",
                name
            );
        }

        ensure!(!self.database.url.is_empty(), "Database URL cannot be empty");
        ensure!(
            self.database.max_connections > 0,
            "Database max_connections must be > 0"
        );
        ensure!(
            self.database.min_connections <= self.database.max_connections,
            "Database min_connections ({}) cannot exceed max_connections ({})",
            self.database.min_connections,
            self.database.max_connections
        );

        ensure!(
            self.sync.poll_interval_secs > 0,
            "Sync poll_interval_secs must be > 0"
        );
        ensure!(
            self.sync.max_blocks_per_run > 0,
            "Sync max_blocks_per_run must be > 0"
        );

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        ensure!(
            LEVELS.contains(&self.logging.level.as_str()),
            "Logging level must be one of: {} (got '{}')",
            LEVELS.join(", "),
            self.logging.level
        );
        ensure!(
            ["json", "pretty"].contains(&self.logging.format.as_str()),
            "Logging format must be json or pretty (got '{}')",
            self.logging.format
        );

        Ok(())
    }
}

/// Scanner context while walking a TOML document.
///
/// Placeholders expand everywhere except comments, so `# e.g. ${RPC_URL}`
/// stays literal. TOML string syntax has to be tracked for that: a `#`
/// inside a string does not open a comment, and an apostrophe inside a
/// `'''` block does not close anything.
#[derive(Clone, Copy, PartialEq)]
enum Ctx {
    Plain,
    Comment,
    Basic,
    Literal,
    MultiBasic,
    MultiLiteral,
}

/// Replace `${VAR_NAME}` placeholders with environment variable values.
///
/// Fails on a placeholder that is unclosed, empty, or names an unset
/// variable.
fn expand_env_vars(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();
    let mut ctx = Ctx::Plain;

    while let Some((at, ch)) = chars.next() {
        if ch == '\n' {
            if ctx == Ctx::Comment {
                ctx = Ctx::Plain;
            }
            out.push(ch);
            continue;
        }

        match ctx {
            Ctx::Comment => out.push(ch),
            _ if ch == '$' && chars.next_if(|&(_, c)| c == '{').is_some() => {
                let name = take_placeholder(&mut chars, at)?;
                let value = std::env::var(&name).map_err(|_| {
                    anyhow::anyhow!(
                        "Environment variable '{}' is not set (referenced at byte {})",
                        name,
                        at
                    )
                })?;
                out.push_str(&value);
            }
            Ctx::Plain => {
                out.push(ch);
                match ch {
                    '#' => ctx = Ctx::Comment,
                    '"' => {
                        ctx = if take_pair(&mut chars, '"', &mut out) {
                            Ctx::MultiBasic
                        } else {
                            Ctx::Basic
                        }
                    }
                    '\'' => {
                        ctx = if take_pair(&mut chars, '\'', &mut out) {
                            Ctx::MultiLiteral
                        } else {
                            Ctx::Literal
                        }
                    }
                    _ => {}
                }
            }
            Ctx::Basic | Ctx::MultiBasic if ch == '\\' => {
                // The escaped character is passed through untouched, so \"
                // does not close the string and \$ does not expand.
                out.push(ch);
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            }
            Ctx::Basic => {
                out.push(ch);
                if ch == '"' {
                    ctx = Ctx::Plain;
                }
            }
            Ctx::Literal => {
                out.push(ch);
                if ch == '\'' {
                    ctx = Ctx::Plain;
                }
            }
            Ctx::MultiBasic => {
                out.push(ch);
                if ch == '"' && take_pair(&mut chars, '"', &mut out) {
                    ctx = Ctx::Plain;
                }
            }
            Ctx::MultiLiteral => {
                out.push(ch);
                if ch == '\'' && take_pair(&mut chars, '\'', &mut out) {
                    ctx = Ctx::Plain;
                }
            }
        }
    }

    Ok(out)
}

/// Consume the placeholder name after `${`, up to the closing brace.
fn take_placeholder(
    chars: &mut std::iter::Peekable<std::str::CharIndices>,
    start: usize,
) -> Result<String> {
    let mut name = String::new();
    for (_, c) in chars.by_ref() {
        if c == '}' {
            ensure!(!name.is_empty(), "Empty placeholder at byte {}", start);
            return Ok(name);
        }
        name.push(c);
    }
    anyhow::bail!("Unclosed placeholder at byte {}", start)
}

/// If the next two characters both equal `quote`, consume them into `out`.
/// Detects the `"""` and `'''` delimiters.
fn take_pair(
    chars: &mut std::iter::Peekable<std::str::CharIndices>,
    quote: char,
    out: &mut String,
) -> bool {
    let mut look = chars.clone();
    let pair = look.next().map(|(_, c)| c) == Some(quote)
        && look.next().map(|(_, c)| c) == Some(quote);
    if pair {
        for _ in 0..2 {
            if let Some((_, c)) = chars.next() {
                out.push(c);
            }
        }
    }
    pair
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A complete, valid configuration. Failure tests patch single lines.
    fn valid_toml() -> String {
        r#"
[network]
rpc_url = "https://base-sepolia.example.com/rpc"
chain_id = 84532

[contracts]
did_registry = "0x00000000000000000000000000000000000000d1"
schema_registry = "0x00000000000000000000000000000000000000d2"
attestation_registry = "0x00000000000000000000000000000000000000d3"
delegation_registry = "0x00000000000000000000000000000000000000d4"
revocation_registry = "0x00000000000000000000000000000000000000d5"

[database]
url = "sqlite://agenttrust.db"
max_connections = 5
min_connections = 1

[sync]
start_block = 100
poll_interval_secs = 12
max_blocks_per_run = 500

[logging]
level = "info"
format = "pretty"
"#
        .to_string()
    }

    fn patched(from: &str, to: &str) -> String {
        let toml = valid_toml();
        assert!(toml.contains(from), "fixture does not contain '{}'", from);
        toml.replace(from, to)
    }

    #[test]
    fn full_config_parses() {
        let config = Config::from_toml_str(&valid_toml()).unwrap();
        assert_eq!(config.network.chain_id, 84532);
        assert_eq!(config.database.url, "sqlite://agenttrust.db");
        assert_eq!(config.sync.start_block, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sync_and_logging_sections_are_optional() {
        let mut toml = valid_toml();
        toml.truncate(toml.find("[sync]").unwrap());

        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.sync.start_block, 0);
        assert_eq!(config.sync.poll_interval_secs, 12);
        assert_eq!(config.sync.max_blocks_per_run, 500);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn pool_bounds_default_when_omitted() {
        let toml = patched("max_connections = 5\nmin_connections = 1\n", "");
        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.min_connections, 1);
    }

    #[test]
    fn rejects_empty_rpc_url() {
        let toml = patched(
            r#"rpc_url = "https://base-sepolia.example.com/rpc""#,
            r#"rpc_url = """#,
        );
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("RPC URL"));
    }

    #[test]
    fn rejects_zero_chain_id() {
        let toml = patched("chain_id = 84532", "chain_id = 0");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("Chain ID"));
    }

    #[test]
    fn rejects_zero_registry_address() {
        let toml = patched(
            "0x00000000000000000000000000000000000000d3",
            "0x0000000000000000000000000000000000000000",
        );
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("attestation_registry"));
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let toml = patched("min_connections = 1", "min_connections = 10");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("min_connections"));
    }

    #[test]
    fn rejects_zero_max_blocks_per_run() {
        let toml = patched("max_blocks_per_run = 500", "max_blocks_per_run = 0");
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("max_blocks_per_run"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let toml = patched(r#"level = "info""#, r#"level = "verbose""#);
        let err = Config::from_toml_str(&toml).unwrap_err();
        assert!(err.to_string().contains("Logging level"));
    }

    #[test]
    fn placeholders_expand_from_the_environment() {
        std::env::set_var("AGENTTRUST_TEST_RPC", "https://rpc.example.com/key");
        std::env::set_var("AGENTTRUST_TEST_DB", "sqlite:///var/lib/agenttrust/indexer.db");

        let expanded = expand_env_vars(
            "rpc_url = \"${AGENTTRUST_TEST_RPC}\"\nurl = \"${AGENTTRUST_TEST_DB}\"",
        )
        .unwrap();
        assert_eq!(
            expanded,
            "rpc_url = \"https://rpc.example.com/key\"\nurl = \"sqlite:///var/lib/agenttrust/indexer.db\""
        );

        std::env::remove_var("AGENTTRUST_TEST_RPC");
        std::env::remove_var("AGENTTRUST_TEST_DB");
    }

    #[test]
    fn text_without_placeholders_is_untouched() {
        let input = valid_toml();
        assert_eq!(expand_env_vars(&input).unwrap(), input);
    }

    #[test]
    fn unset_variable_is_an_error() {
        let err = expand_env_vars("url = \"${AGENTTRUST_TEST_UNSET_VAR}\"").unwrap_err();
        assert!(err.to_string().contains("AGENTTRUST_TEST_UNSET_VAR"));
    }

    #[test]
    fn empty_placeholder_is_an_error() {
        let err = expand_env_vars("url = \"${}\"").unwrap_err();
        assert!(err.to_string().contains("Empty"));
    }

    #[test]
    fn unclosed_placeholder_is_an_error() {
        let err = expand_env_vars("url = \"${AGENTTRUST_TEST_OPEN").unwrap_err();
        assert!(err.to_string().contains("Unclosed"));
    }

    #[test]
    fn placeholders_in_comments_stay_literal() {
        let input = "# template: set ${AGENTTRUST_TEST_NOT_SET}\nkey = \"value\"\n";
        let expanded = expand_env_vars(input).unwrap();
        assert_eq!(expanded, input);
    }

    #[test]
    fn comment_after_a_value_stays_literal() {
        std::env::set_var("AGENTTRUST_TEST_KEY", "secret");

        let expanded = expand_env_vars(
            "key = \"${AGENTTRUST_TEST_KEY}\"  # e.g. ${AGENTTRUST_TEST_OTHER}",
        )
        .unwrap();
        assert_eq!(
            expanded,
            "key = \"secret\"  # e.g. ${AGENTTRUST_TEST_OTHER}"
        );

        std::env::remove_var("AGENTTRUST_TEST_KEY");
    }

    #[test]
    fn hash_inside_a_string_is_not_a_comment() {
        std::env::set_var("AGENTTRUST_TEST_FRAGMENT", "token");

        let expanded = expand_env_vars(
            "rpc_url = \"https://example.com/#${AGENTTRUST_TEST_FRAGMENT}\"",
        )
        .unwrap();
        assert_eq!(expanded, "rpc_url = \"https://example.com/#token\"");

        std::env::remove_var("AGENTTRUST_TEST_FRAGMENT");
    }

    #[test]
    fn escaped_quote_does_not_close_a_basic_string() {
        std::env::set_var("AGENTTRUST_TEST_QUOTED", "x");

        let expanded =
            expand_env_vars("key = \"a \\\" b ${AGENTTRUST_TEST_QUOTED}\"").unwrap();
        assert_eq!(expanded, "key = \"a \\\" b x\"");

        std::env::remove_var("AGENTTRUST_TEST_QUOTED");
    }

    #[test]
    fn apostrophe_inside_multiline_literal_keeps_scanning_sane() {
        // If the apostrophe in "It's" flipped the scanner into string mode,
        // the comment below would be expanded and fail on the unset name.
        let input = "description = '''\nIt's fine\n'''\n# uses ${AGENTTRUST_TEST_NOT_SET}\n";
        let expanded = expand_env_vars(input).unwrap();
        assert_eq!(expanded, input);
    }

    #[test]
    fn placeholders_expand_inside_multiline_strings() {
        std::env::set_var("AGENTTRUST_TEST_BODY", "payload");

        let expanded =
            expand_env_vars("notes = \"\"\"\nline ${AGENTTRUST_TEST_BODY}\n\"\"\"").unwrap();
        assert_eq!(expanded, "notes = \"\"\"\nline payload\n\"\"\"");

        std::env::remove_var("AGENTTRUST_TEST_BODY");
    }
}
