//! Tipos de erro para o cliente do serviço de diretório.
//!
//! Define [`MembershipError`] com variantes para grupo inexistente, erros do
//! cliente (4xx), erros do servidor (5xx), falhas de rede e circuito aberto.
//! Apenas as duas últimas categorias de falha remota são retentáveis.

use thiserror::Error;

/// Erros que podem ocorrer ao consultar os membros de um grupo.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// O diretório respondeu HTTP 404 para o grupo.
    #[error("staff group not found: {0}")]
    NotFound(String),

    /// Qualquer outro 4xx. Repetir a chamada não muda o resultado.
    #[error("client error from directory (status {status}): {message}")]
    Client { status: u16, message: String },

    /// Erro 5xx do diretório.
    #[error("server error from directory (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Falha na camada de rede (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Corpo de resposta que não é uma lista de identificadores.
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// O disjuntor está aberto após falhas sucessivas.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// URL base ou cliente HTTP mal configurados.
    #[error("invalid directory client configuration: {0}")]
    Config(String),
}

impl MembershipError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MembershipError::Server { .. } | MembershipError::Network(_))
    }
}
