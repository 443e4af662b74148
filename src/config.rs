//! Configuração do agendador carregada a partir de `scheduler.toml`.
//!
//! A struct [`SchedulerConfig`] contém todos os parâmetros configuráveis,
//! agrupados por seção. Valores não presentes no arquivo usam defaults
//! sensíveis. As variáveis de ambiente `SCHEDULER_REDIS_URL` e
//! `SCHEDULER_DIRECTORY_URL` têm precedência sobre o arquivo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;

use crate::error::SchedulerError;
use crate::schedule::RuleConfig;

const DEFAULT_CONFIG_FILE: &str = "scheduler.toml";

/// Configuração de nível superior carregada de `scheduler.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerConfig {
    /// Regras do gerador de escalas.
    #[serde(default)]
    pub rules: RuleConfig,

    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub membership: MembershipConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// URL do Redis para os locks distribuídos. Sem ela, os locks ficam em memória.
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// Parâmetros do lock por job.
#[derive(Debug, Clone, Deserialize)]
pub struct LockConfig {
    /// Tempo de vida do lock em segundos.
    #[serde(default = "default_lock_ttl_secs")]
    pub ttl_secs: u64,

    /// Prefixo das chaves de lock.
    #[serde(default = "default_lock_key_prefix")]
    pub key_prefix: String,
}

/// Cliente do serviço de diretório (membros de grupos).
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipConfig {
    /// URL base do serviço de diretório.
    #[serde(default = "default_directory_url")]
    pub base_url: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub breaker: BreakerConfig,
}

/// Política de retentativas com backoff exponencial.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Número máximo de tentativas, incluindo a primeira.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Atraso base em milissegundos.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Teto do atraso em milissegundos.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Parâmetros do disjuntor (circuit breaker).
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    /// Falhas consecutivas até abrir o circuito.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Segundos em que o circuito permanece aberto.
    #[serde(default = "default_open_secs")]
    pub open_secs: u64,
}

/// Pool de workers de geração.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Varredura diária de promoção de status.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Horário local de execução diária.
    #[serde(default = "default_run_at")]
    pub run_at: NaiveTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_lock_ttl_secs() -> u64 {
    60
}

fn default_lock_key_prefix() -> String {
    "lock:job".to_string()
}

fn default_directory_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_response_timeout_ms() -> u64 {
    10_000
}

// Valor padrão para tentativas máximas: 3.
fn default_max_attempts() -> u32 {
    3
}

// Valor padrão para o atraso base: 500ms.
fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_open_secs() -> u64 {
    30
}

fn default_pool_size() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_run_at() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 5, 0).unwrap_or(NaiveTime::MIN)
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_lock_ttl_secs(),
            key_prefix: default_lock_key_prefix(),
        }
    }
}

impl LockConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            retry: RetryConfig::default(),
            breaker: BreakerConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Atraso antes da próxima tentativa após a tentativa `attempt` (1-based):
    /// base_delay_ms * 2^(attempt - 1), limitado a max_delay_ms.
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_secs: default_open_secs(),
        }
    }
}

impl BreakerConfig {
    pub fn open_duration(&self) -> Duration {
        Duration::from_secs(self.open_secs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_at: default_run_at(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl SchedulerConfig {
    /// Carrega a configuração do caminho informado, de `SCHEDULER_CONFIG`
    /// ou de `scheduler.toml` no diretório atual, nessa ordem.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var("SCHEDULER_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Self::from_toml_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, SchedulerError> {
        Ok(toml::from_str::<SchedulerConfig>(contents)?)
    }

    // Variáveis de ambiente têm precedência sobre o arquivo de configuração.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SCHEDULER_REDIS_URL")
            && !url.is_empty()
        {
            self.redis_url = Some(url);
        }
        if let Ok(url) = std::env::var("SCHEDULER_DIRECTORY_URL")
            && !url.is_empty()
        {
            self.membership.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.rules.period_weeks == 0 {
            return Err(SchedulerError::Config("rules.period_weeks must be at least 1".into()));
        }
        if self.rules.day_off.days_per_week > 6 {
            return Err(SchedulerError::Config(
                "rules.day_off.days_per_week must be at most 6".into(),
            ));
        }
        if self.worker.pool_size == 0 {
            return Err(SchedulerError::Config("worker.pool_size must be at least 1".into()));
        }
        if self.worker.queue_capacity == 0 {
            return Err(SchedulerError::Config(
                "worker.queue_capacity must be at least 1".into(),
            ));
        }
        if self.membership.retry.max_attempts == 0 {
            return Err(SchedulerError::Config(
                "membership.retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.membership.breaker.failure_threshold == 0 {
            return Err(SchedulerError::Config(
                "membership.breaker.failure_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
