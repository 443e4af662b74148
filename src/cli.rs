//! Interface de linha de comando do shift-scheduler baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (serve, preview)
//! e flags globais (--config, --verbose, --json-logs).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Geração de escalas de turnos em segundo plano.
#[derive(Debug, Parser)]
#[command(name = "shift-scheduler", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para o arquivo de configuração TOML.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Emite logs em JSON, um objeto por linha.
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sobe a API HTTP, o pool de workers e a varredura diária.
    Serve {
        /// Endereço de escuta; sobrescreve `server.bind` da configuração.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Gera uma escala localmente, sem API nem diretório, e a exibe.
    Preview {
        /// Identificadores dos funcionários, separados por vírgula.
        #[arg(long, value_delimiter = ',', required = true)]
        staff: Vec<String>,

        /// Segunda-feira em que a escala começa (AAAA-MM-DD).
        #[arg(long)]
        week_begin: NaiveDate,

        /// Semente do gerador aleatório, para resultados reproduzíveis.
        #[arg(long)]
        seed: Option<u64>,

        /// Imprime as atribuições em JSON em vez da grade colorida.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
