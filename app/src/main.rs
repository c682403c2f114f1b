mod api;
mod cnpj;
mod config;
mod grouping;
mod models;
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, DEFAULT_MAX_PAYLOAD};

#[derive(Parser)]
#[command(name = "cnpj-api")]
#[command(about = "Validação e agrupamento de CNPJs numéricos", long_about = None)]
struct Cli {
    /// Modo silencioso (menos saída)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Modo verboso (mais detalhes)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inicia servidor web API para validação e agrupamento de CNPJ
    Server {
        /// Endereço do servidor
        #[arg(long, env = "CNPJ_API_HOST", default_value = "127.0.0.1")]
        host: String,
        /// Porta do servidor
        #[arg(short, long, env = "CNPJ_API_PORT", default_value = "8080")]
        port: u16,
        /// Número de workers (padrão: um por CPU)
        #[arg(short, long, env = "CNPJ_API_WORKERS")]
        workers: Option<usize>,
        /// Tamanho máximo, em bytes, do corpo JSON dos lotes
        #[arg(long, env = "CNPJ_API_MAX_PAYLOAD", default_value_t = DEFAULT_MAX_PAYLOAD)]
        max_payload: usize,
    },
    /// Decompõe e valida CNPJs numéricos
    Inspect {
        #[arg(required = true, allow_negative_numbers = true)]
        cnpjs: Vec<String>,
    },
    /// Agrupa CNPJs numéricos por região (dois primeiros dígitos)
    Group {
        #[arg(required = true, allow_negative_numbers = true)]
        cnpjs: Vec<String>,
    },
    /// Calcula os dígitos verificadores de uma base de 12 dígitos
    CheckDigits {
        #[arg(allow_negative_numbers = true)]
        base: String,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default = if quiet {
        "warn"
    } else if verbose {
        "cnpj_api=debug,actix_web=info"
    } else {
        "cnpj_api=info,actix_web=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn inspect(raw: &[String]) -> Result<()> {
    let mut rejected = 0;
    for input in raw {
        match cnpj::parse_integer(input).and_then(cnpj::decompose_and_validate) {
            Ok(d) => ui::print_cnpj_line(
                &d.cnpj.to_string(),
                &d.cnpj.formatted(),
                &format!("região {} filial {}", d.region, d.branch),
                d.valid,
            ),
            Err(e) => {
                ui::print_error(&e.to_string());
                rejected += 1;
            }
        }
    }

    if rejected > 0 {
        bail!("{} CNPJ(s) rejeitado(s)", rejected);
    }
    Ok(())
}

fn group(raw: &[String]) -> Result<()> {
    let values = raw
        .iter()
        .map(|input| cnpj::parse_integer(input))
        .collect::<Result<Vec<_>, _>>()?;
    let groups = grouping::group_batch(&values).context("Lote rejeitado")?;

    for (region, members) in groups.iter() {
        let members: Vec<String> = members
            .iter()
            .map(|c| format!("{} {}", c, c.formatted()))
            .collect();
        ui::print_group(&region.to_string(), &members);
    }
    ui::print_statistics(&[
        ("CNPJs", groups.total() as u64),
        ("Regiões", groups.len() as u64),
    ]);
    Ok(())
}

fn check_digits(raw: &str) -> Result<()> {
    let result = cnpj::parse_integer(raw).and_then(cnpj::compute_check_digits)?;
    ui::print_cnpj_line(
        &result.cnpj.to_string(),
        &result.cnpj.formatted(),
        &format!("dígitos {}{}", result.digits[0], result.digits[1]),
        true,
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Inicializa o módulo de UI com as configurações globais
    ui::init(cli.quiet, cli.verbose);
    init_tracing(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Server { host, port, workers, max_payload } => {
            let config = ServerConfig::new(host, port, workers, max_payload)
                .context("Configuração do servidor inválida")?;
            api::start_server(&config).await?;
        }
        Commands::Inspect { cnpjs } => inspect(&cnpjs)?,
        Commands::Group { cnpjs } => group(&cnpjs)?,
        Commands::CheckDigits { base } => check_digits(&base)?,
    }

    Ok(())
}
