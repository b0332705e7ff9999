//! Server configuration: store location, source CSV path, listen port

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "./social_media_data.db";
pub const DEFAULT_CSV_PATH: &str = "data/Cleaned_Viral_Social_Media_Trends.csv";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub csv_path: PathBuf,
    pub port: u16,
}

impl ServerConfig {
    /// Resolve the effective configuration. CLI flags win over environment,
    /// environment wins over defaults. The only environment setting is the
    /// store location (`SQLITE_DB_PATH`).
    pub fn resolve(
        db_path: Option<PathBuf>,
        csv_path: Option<PathBuf>,
        port: Option<u16>,
    ) -> Self {
        let db_path = db_path
            .or_else(|| std::env::var("SQLITE_DB_PATH").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        Self {
            db_path,
            csv_path: csv_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH)),
            port: port.unwrap_or(DEFAULT_PORT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        let config = ServerConfig::resolve(
            Some(PathBuf::from("/tmp/override.db")),
            Some(PathBuf::from("/tmp/override.csv")),
            Some(9000),
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.csv_path, PathBuf::from("/tmp/override.csv"));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_csv_and_port_default() {
        let config = ServerConfig::resolve(Some(PathBuf::from("/tmp/x.db")), None, None);
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
