//! 引擎配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | WORK_DIR | /var/lib/shop/engine | 工作目录（数据库文件所在） |
//! | DB_FILE | shop.redb | 数据库文件名 |
//! | LOG_LEVEL | info | 日志级别 |
//! | LOG_DIR | (无) | 日志目录，设置后输出到文件 |
//!
//! # 示例
//!
//! ```ignore
//! WORK_DIR=/data/shop LOG_LEVEL=debug ...
//! ```

use std::path::PathBuf;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库文件
    pub work_dir: String,
    /// 数据库文件名
    pub db_file: String,
    /// 日志级别: trace | debug | info | warn | error
    pub log_level: String,
    /// 日志目录 (可选，设置后写入滚动日志文件)
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        // .env 文件可选，缺失时静默跳过
        let _ = dotenv::dotenv();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/shop/engine".into()),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "shop.redb".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Full path of the database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_joins_work_dir_and_file() {
        let config = Config {
            work_dir: "/data/shop".into(),
            db_file: "shop.redb".into(),
            log_level: "info".into(),
            log_dir: None,
        };
        assert_eq!(config.db_path(), PathBuf::from("/data/shop/shop.redb"));
    }
}
