// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for Maestro
//!
//! Layered configuration with precedence: explicit overrides > process
//! environment > `config.yml` > `secrets.yml` > field defaults. A config
//! file that exists but is invalid fails construction with one
//! `Configuration` error listing every problem; a missing file is fine.
//! Environment access is injected as a map so tests never mutate process
//! state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::{MaestroError, Result};
use crate::llm::provider::ReasoningEffort;

/// Config file searched in the working directory
pub const CONFIG_FILE: &str = "config.yml";
/// Secrets file searched in the working directory
pub const SECRETS_FILE: &str = "secrets.yml";
/// Environment variable carrying the LLM credential
pub const API_KEY_ENV: &str = "MAESTRO_API_KEY";

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Model identifier passed to the provider
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Sampling temperature (0.0-1.0)
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,

    /// Reasoning effort: low, medium, or high
    #[serde(default = "default_llm_reasoning_effort")]
    pub llm_reasoning_effort: String,

    /// Max tool-loop iterations per agent invocation
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,

    /// Wall-clock bound for a full supervisor run (seconds)
    #[serde(default = "default_supervisor_timeout")]
    pub supervisor_timeout: f64,

    /// Wall-clock bound for a specialist-as-tool invocation (seconds)
    #[serde(default = "default_specialist_timeout")]
    pub specialist_timeout: f64,

    /// Wall-clock bound for the formatter call (seconds)
    #[serde(default = "default_formatter_timeout")]
    pub formatter_timeout: f64,

    /// Per-LLM-request timeout (seconds)
    #[serde(default = "default_llm_request_timeout")]
    pub llm_request_timeout: f64,

    /// Whether conversation summarization is active
    #[serde(default)]
    pub summarization_enabled: bool,

    /// Estimated token count that triggers summarization
    #[serde(default = "default_summarization_trigger_tokens")]
    pub summarization_trigger_tokens: u32,

    /// Messages kept verbatim when summarizing
    #[serde(default = "default_summarization_keep_messages")]
    pub summarization_keep_messages: usize,

    /// Development-only prompt debugging
    #[serde(default)]
    pub debug: bool,

    /// Per-field truncation for prompt debug output
    #[serde(default = "default_debug_prompt_max_length")]
    pub debug_prompt_max_length: usize,

    /// Whether prompt debug also logs model responses
    #[serde(default = "default_true")]
    pub debug_show_response: bool,

    /// URL allowlist policy for remote-access tools
    #[serde(default)]
    pub url_security: UrlSecurityConfig,

    /// Application log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for CLI-mode log files
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Fixed log file name (timestamped name when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filename: Option<String>,

    /// LLM credential (env or secrets file; never serialized)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Arbitrary extra top-level keys (per-agent subtrees and the like)
    #[serde(flatten)]
    pub extras: BTreeMap<String, serde_yaml::Value>,
}

/// URL security policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlSecurityConfig {
    /// Whether the allowlist is enforced
    #[serde(default)]
    pub enabled: bool,

    /// Allowed domains; `*.example.com` wildcards use strict suffix matching
    #[serde(default)]
    pub allow_domains: Vec<String>,

    /// Allowed IP ranges in CIDR notation
    #[serde(default)]
    pub allow_ips: Vec<String>,

    /// Whether localhost targets are allowed
    #[serde(default)]
    pub allow_localhost: bool,

    /// Log denied attempts
    #[serde(default = "default_true")]
    pub log_blocked_attempts: bool,
}

impl Default for UrlSecurityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_domains: Vec::new(),
            allow_ips: Vec::new(),
            allow_localhost: false,
            log_blocked_attempts: true,
        }
    }
}

// Default value functions

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_temperature() -> f32 {
    0.2
}

fn default_llm_reasoning_effort() -> String {
    "medium".to_string()
}

fn default_recursion_limit() -> u32 {
    50
}

fn default_supervisor_timeout() -> f64 {
    120.0
}

fn default_specialist_timeout() -> f64 {
    90.0
}

fn default_formatter_timeout() -> f64 {
    30.0
}

fn default_llm_request_timeout() -> f64 {
    60.0
}

fn default_summarization_trigger_tokens() -> u32 {
    50_000
}

fn default_summarization_keep_messages() -> usize {
    8
}

fn default_debug_prompt_max_length() -> usize {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_model: default_llm_model(),
            llm_temperature: default_llm_temperature(),
            llm_reasoning_effort: default_llm_reasoning_effort(),
            recursion_limit: default_recursion_limit(),
            supervisor_timeout: default_supervisor_timeout(),
            specialist_timeout: default_specialist_timeout(),
            formatter_timeout: default_formatter_timeout(),
            llm_request_timeout: default_llm_request_timeout(),
            summarization_enabled: false,
            summarization_trigger_tokens: default_summarization_trigger_tokens(),
            summarization_keep_messages: default_summarization_keep_messages(),
            debug: false,
            debug_prompt_max_length: default_debug_prompt_max_length(),
            debug_show_response: true,
            url_security: UrlSecurityConfig::default(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            log_filename: None,
            api_key: None,
            extras: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from the working directory and process environment
    pub fn load() -> Result<Self> {
        let env: BTreeMap<String, String> = std::env::vars().collect();
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd, &env)
    }

    /// Load settings from a specific directory with an explicit environment
    pub fn load_from(dir: &Path, env: &BTreeMap<String, String>) -> Result<Self> {
        let mut problems: Vec<String> = Vec::new();

        // Layer: config file
        let mut settings = match Self::read_file(&dir.join(CONFIG_FILE)) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => Self::default(),
            Err(e) => {
                return Err(MaestroError::Configuration(format!(
                    "{}: {}",
                    CONFIG_FILE, e
                )))
            }
        };

        // Layer: secrets file (below config; only fills gaps)
        match Self::read_secrets(&dir.join(SECRETS_FILE)) {
            Ok(secrets) => {
                if settings.api_key.is_none() {
                    settings.api_key = secrets.get("api_key").cloned();
                }
            }
            Err(e) => problems.push(format!("{}: {}", SECRETS_FILE, e)),
        }

        // Layer: environment (above file)
        settings.apply_env(env, &mut problems);

        settings.validate(&mut problems);

        if !problems.is_empty() {
            return Err(MaestroError::Configuration(problems.join("\n")));
        }

        settings.warn_on_timeout_ordering();
        Ok(settings)
    }

    fn read_file(path: &Path) -> std::result::Result<Option<Self>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_yaml::from_str(&content)
            .map(Some)
            .map_err(|e| e.to_string())
    }

    fn read_secrets(path: &Path) -> std::result::Result<BTreeMap<String, String>, String> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    }

    /// Apply environment overrides, collecting parse problems
    fn apply_env(&mut self, env: &BTreeMap<String, String>, problems: &mut Vec<String>) {
        fn parse_into<T: std::str::FromStr>(
            env: &BTreeMap<String, String>,
            key: &str,
            target: &mut T,
            problems: &mut Vec<String>,
        ) {
            if let Some(raw) = env.get(key) {
                match raw.parse() {
                    Ok(value) => *target = value,
                    Err(_) => problems.push(format!("{}: cannot parse '{}'", key, raw)),
                }
            }
        }

        fn parse_bool(
            env: &BTreeMap<String, String>,
            key: &str,
            target: &mut bool,
            problems: &mut Vec<String>,
        ) {
            if let Some(raw) = env.get(key) {
                match raw.to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => *target = true,
                    "0" | "false" | "no" | "off" => *target = false,
                    _ => problems.push(format!("{}: cannot parse '{}' as bool", key, raw)),
                }
            }
        }

        fn parse_list(env: &BTreeMap<String, String>, key: &str, target: &mut Vec<String>) {
            if let Some(raw) = env.get(key) {
                *target = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }

        parse_into(env, "LLM_MODEL", &mut self.llm_model, problems);
        parse_into(env, "LLM_TEMPERATURE", &mut self.llm_temperature, problems);
        parse_into(
            env,
            "LLM_REASONING_EFFORT",
            &mut self.llm_reasoning_effort,
            problems,
        );
        parse_into(env, "RECURSION_LIMIT", &mut self.recursion_limit, problems);
        parse_into(
            env,
            "SUPERVISOR_TIMEOUT",
            &mut self.supervisor_timeout,
            problems,
        );
        parse_into(
            env,
            "SPECIALIST_TIMEOUT",
            &mut self.specialist_timeout,
            problems,
        );
        parse_into(
            env,
            "FORMATTER_TIMEOUT",
            &mut self.formatter_timeout,
            problems,
        );
        parse_into(
            env,
            "LLM_REQUEST_TIMEOUT",
            &mut self.llm_request_timeout,
            problems,
        );
        parse_bool(
            env,
            "SUMMARIZATION_ENABLED",
            &mut self.summarization_enabled,
            problems,
        );
        parse_into(
            env,
            "SUMMARIZATION_TRIGGER_TOKENS",
            &mut self.summarization_trigger_tokens,
            problems,
        );
        parse_into(
            env,
            "SUMMARIZATION_KEEP_MESSAGES",
            &mut self.summarization_keep_messages,
            problems,
        );
        parse_bool(env, "DEBUG", &mut self.debug, problems);
        parse_into(
            env,
            "DEBUG_PROMPT_MAX_LENGTH",
            &mut self.debug_prompt_max_length,
            problems,
        );
        parse_bool(
            env,
            "DEBUG_SHOW_RESPONSE",
            &mut self.debug_show_response,
            problems,
        );
        parse_into(env, "LOG_LEVEL", &mut self.log_level, problems);
        if let Some(dir) = env.get("LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(name) = env.get("LOG_FILENAME") {
            self.log_filename = Some(name.clone());
        }

        parse_bool(
            env,
            "URL_SECURITY__ENABLED",
            &mut self.url_security.enabled,
            problems,
        );
        parse_list(
            env,
            "URL_SECURITY__ALLOW_DOMAINS",
            &mut self.url_security.allow_domains,
        );
        parse_list(
            env,
            "URL_SECURITY__ALLOW_IPS",
            &mut self.url_security.allow_ips,
        );
        parse_bool(
            env,
            "URL_SECURITY__ALLOW_LOCALHOST",
            &mut self.url_security.allow_localhost,
            problems,
        );
        parse_bool(
            env,
            "URL_SECURITY__LOG_BLOCKED_ATTEMPTS",
            &mut self.url_security.log_blocked_attempts,
            problems,
        );

        if let Some(key) = env.get(API_KEY_ENV) {
            self.api_key = Some(key.clone());
        }
    }

    /// Validate field values, collecting problems (fail-closed)
    fn validate(&self, problems: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&self.llm_temperature) {
            problems.push(format!(
                "llm_temperature: must be between 0.0 and 1.0, got {}",
                self.llm_temperature
            ));
        }
        if ReasoningEffort::parse(&self.llm_reasoning_effort).is_none() {
            problems.push(format!(
                "llm_reasoning_effort: must be one of low, medium, high; got '{}'",
                self.llm_reasoning_effort
            ));
        }
        if self.recursion_limit == 0 {
            problems.push("recursion_limit: must be a positive integer".to_string());
        }
        for (name, value) in [
            ("supervisor_timeout", self.supervisor_timeout),
            ("specialist_timeout", self.specialist_timeout),
            ("formatter_timeout", self.formatter_timeout),
            ("llm_request_timeout", self.llm_request_timeout),
        ] {
            if !value.is_finite() || value <= 0.0 {
                problems.push(format!("{}: must be a positive number, got {}", name, value));
            }
        }
    }

    /// Timeout-hierarchy violations are warnings, never errors
    fn warn_on_timeout_ordering(&self) {
        if self.llm_request_timeout > self.specialist_timeout {
            warn!(
                "llm_request_timeout ({}) exceeds specialist_timeout ({})",
                self.llm_request_timeout, self.specialist_timeout
            );
        }
        if self.specialist_timeout > self.supervisor_timeout {
            warn!(
                "specialist_timeout ({}) exceeds supervisor_timeout ({})",
                self.specialist_timeout, self.supervisor_timeout
            );
        }
    }

    /// Reasoning effort as a typed value (validated at load)
    pub fn reasoning_effort(&self) -> ReasoningEffort {
        ReasoningEffort::parse(&self.llm_reasoning_effort).unwrap_or_default()
    }

    /// View of an agent-specific extras subtree, if present
    pub fn extras_for(&self, name: &str) -> Option<&serde_yaml::Value> {
        self.extras.get(name)
    }

    /// Per-agent recursion limit override from extras, falling back to the
    /// global value
    pub fn recursion_limit_for(&self, agent: &str) -> u32 {
        self.extras_for(agent)
            .and_then(|v| v.get("recursion_limit"))
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(self.recursion_limit)
    }

    pub fn supervisor_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.supervisor_timeout)
    }

    pub fn specialist_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.specialist_timeout)
    }

    pub fn formatter_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.formatter_timeout)
    }

    pub fn llm_request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.llm_request_timeout)
    }

    /// One-screen summary for the `info` subcommand
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("llm_model: {}\n", self.llm_model));
        out.push_str(&format!("llm_temperature: {}\n", self.llm_temperature));
        out.push_str(&format!(
            "llm_reasoning_effort: {}\n",
            self.llm_reasoning_effort
        ));
        out.push_str(&format!("recursion_limit: {}\n", self.recursion_limit));
        out.push_str(&format!(
            "timeouts: supervisor={}s specialist={}s formatter={}s llm_request={}s\n",
            self.supervisor_timeout,
            self.specialist_timeout,
            self.formatter_timeout,
            self.llm_request_timeout
        ));
        out.push_str(&format!(
            "summarization: enabled={} trigger_tokens={} keep_messages={}\n",
            self.summarization_enabled,
            self.summarization_trigger_tokens,
            self.summarization_keep_messages
        ));
        out.push_str(&format!(
            "url_security: enabled={} domains={} ips={} localhost={}\n",
            self.url_security.enabled,
            self.url_security.allow_domains.len(),
            self.url_security.allow_ips.len(),
            self.url_security.allow_localhost
        ));
        out.push_str(&format!(
            "logging: level={} dir={}\n",
            self.log_level,
            self.log_dir.display()
        ));
        out.push_str(&format!("api_key: {}\n",
            if self.api_key.is_some() { "set" } else { "not set" }
        ));
        out
    }
}
