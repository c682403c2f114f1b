use anyhow::{bail, Result};

pub const DEFAULT_MAX_PAYLOAD: usize = 256 * 1024;

/// Configuração do servidor HTTP, já validada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub max_payload: usize,
}

impl ServerConfig {
    /// `workers` ausente usa um worker por CPU.
    pub fn new(host: String, port: u16, workers: Option<usize>, max_payload: usize) -> Result<Self> {
        if host.trim().is_empty() {
            bail!("Endereço do servidor não pode ser vazio");
        }
        let workers = workers.unwrap_or_else(num_cpus::get);
        if workers == 0 {
            bail!("Número de workers deve ser maior que zero");
        }
        if max_payload == 0 {
            bail!("Limite de payload deve ser maior que zero");
        }

        Ok(Self {
            host,
            port,
            workers,
            max_payload,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_workers_to_cpu_count() {
        let config = ServerConfig::new("127.0.0.1".into(), 8080, None, DEFAULT_MAX_PAYLOAD).unwrap();
        assert_eq!(config.workers, num_cpus::get());
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn rejects_zero_workers_and_empty_host() {
        assert!(ServerConfig::new("127.0.0.1".into(), 8080, Some(0), DEFAULT_MAX_PAYLOAD).is_err());
        assert!(ServerConfig::new("  ".into(), 8080, Some(2), DEFAULT_MAX_PAYLOAD).is_err());
        assert!(ServerConfig::new("0.0.0.0".into(), 8080, Some(2), 0).is_err());
    }
}
