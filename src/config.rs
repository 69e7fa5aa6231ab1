use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::solver::SolverOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Solver tuning as it appears in the config file. Kept separate from
/// [`SolverOptions`] so the wire format can stay stable if solver
/// internals grow more knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_outer_iterations: usize,
    pub max_inner_iterations: usize,
    pub initial_penalty: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let defaults = SolverOptions::default();
        Self {
            tolerance: defaults.tolerance,
            max_outer_iterations: defaults.max_outer_iterations,
            max_inner_iterations: defaults.max_inner_iterations,
            initial_penalty: defaults.initial_penalty,
        }
    }
}

impl SolverConfig {
    pub fn options(&self) -> SolverOptions {
        SolverOptions {
            tolerance: self.tolerance,
            max_outer_iterations: self.max_outer_iterations,
            max_inner_iterations: self.max_inner_iterations,
            initial_penalty: self.initial_penalty,
            ..SolverOptions::default()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("WARDROP__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr_parses() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            enable_cors: true,
            request_timeout_secs: 30,
        };
        assert_eq!(server.socket_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_solver_config_maps_onto_options() {
        let config = SolverConfig {
            tolerance: 1e-8,
            max_outer_iterations: 10,
            max_inner_iterations: 100,
            initial_penalty: 5.0,
        };
        let options = config.options();
        assert_eq!(options.tolerance, 1e-8);
        assert_eq!(options.max_outer_iterations, 10);
        assert_eq!(options.max_inner_iterations, 100);
        assert_eq!(options.initial_penalty, 5.0);
    }
}
