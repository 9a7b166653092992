use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_CAR_IPS: &str = "192.168.4.2,192.168.4.3,192.168.4.4,192.168.4.5";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub car_ips: Vec<String>,
    pub car_port: u16,
    pub log_path: PathBuf,
    pub grid_size: i32,
    /// Wait after a failed connect before trying the next address.
    pub retry_delay: Duration,
    /// Wait after every address in the list has failed.
    pub round_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            car_ips: parse_ip_list(DEFAULT_CAR_IPS),
            car_port: 81,
            log_path: PathBuf::from("detections_log.txt"),
            grid_size: 11,
            retry_delay: Duration::from_millis(1_000),
            round_delay: Duration::from_millis(5_000),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        let host = env::var("ROVER_HOST").unwrap_or(d.host);
        let port = env::var("ROVER_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(d.port);
        let car_ips = env::var("ROVER_CAR_IPS").map(|s| parse_ip_list(&s)).unwrap_or(d.car_ips);
        let car_port = env::var("ROVER_CAR_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(d.car_port);
        let log_path = env::var("ROVER_LOG_PATH").map(PathBuf::from).unwrap_or(d.log_path);
        let grid_size = env::var("ROVER_GRID_SIZE")
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(d.grid_size);
        let retry_delay = env::var("ROVER_RETRY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(d.retry_delay);
        let round_delay = env::var("ROVER_ROUND_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(d.round_delay);

        if car_ips.is_empty() {
            anyhow::bail!("ROVER_CAR_IPS is set but lists no addresses");
        }

        Ok(Self { host, port, car_ips, car_port, log_path, grid_size, retry_delay, round_delay })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn car_endpoints(&self) -> Vec<String> {
        self.car_ips.iter().map(|ip| format!("ws://{}:{}", ip, self.car_port)).collect()
    }
}

fn parse_ip_list(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|ip| !ip.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_use_car_port() {
        let cfg = Config { car_ips: parse_ip_list("10.0.0.1, 10.0.0.2,"), ..Config::default() };
        assert_eq!(cfg.car_endpoints(), vec!["ws://10.0.0.1:81", "ws://10.0.0.2:81"]);
    }

    #[test]
    fn default_addr_parses() {
        assert_eq!(Config::default().addr().unwrap().port(), 8000);
    }
}
