use dialoguer::{Input, Password};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 配置文件名，依次在当前工作目录与可执行文件所在目录查找
pub const CONFIG_FILE: &str = "sshput.toml";

/// 配置结构：包含 SSH 参数与本地/远端路径
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SshConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// TCP 连接超时秒数（可选，默认 10 秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    /// 本地工作区根目录
    #[serde(default = "default_local_root")]
    pub local_root: String,
    /// 远端基础路径，所有文件按相对路径放到它下面
    #[serde(default)]
    pub remote_base: String,
}

fn default_port() -> u16 {
    22
}

fn default_local_root() -> String {
    ".".to_string()
}

impl Default for SshConfig {
    fn default() -> Self {
        SshConfig {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            timeout_secs: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            local_root: default_local_root(),
            remote_base: String::new(),
        }
    }
}

impl Config {
    /// 检查必填项是否齐全，返回首个缺失项
    pub fn check_complete(&self) -> Result<(), ConfigError> {
        if self.ssh.host.trim().is_empty() {
            return Err(ConfigError::Incomplete("ssh.host"));
        }
        if self.ssh.username.trim().is_empty() {
            return Err(ConfigError::Incomplete("ssh.username"));
        }
        if self.ssh.password.is_empty() {
            return Err(ConfigError::Incomplete("ssh.password"));
        }
        if self.paths.remote_base.trim().is_empty() {
            return Err(ConfigError::Incomplete("paths.remote_base"));
        }
        Ok(())
    }
}

fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// 从 sshput.toml 加载配置：优先当前工作目录，其次可执行文件所在目录
pub fn load_config() -> Result<Config, ConfigError> {
    // 1) 优先尝试当前工作目录下的 sshput.toml
    let cwd_path = Path::new(CONFIG_FILE);
    let candidate_paths: Vec<PathBuf> = if cwd_path.exists() {
        vec![cwd_path.to_path_buf()]
    } else {
        // 2) 回退到可执行文件所在目录
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()));
        let mut v = Vec::new();
        if let Some(dir) = exe_dir {
            v.push(dir.join(CONFIG_FILE));
        }
        v
    };

    for p in candidate_paths {
        if p.exists() {
            let content = fs::read_to_string(&p)?;
            return parse_config(&content);
        }
    }

    Err(ConfigError::NotFound(CONFIG_FILE.to_string()))
}

/// 把配置写回磁盘
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(cfg)?;
    fs::write(path, content)?;
    Ok(())
}

/// 交互式编辑连接参数并写回当前目录的 sshput.toml；
/// 回车保留方括号里的当前值
pub fn configure() -> Result<(), ConfigError> {
    let mut cfg = load_config().unwrap_or_default();

    cfg.ssh.host = Input::new()
        .with_prompt("SSH 服务器地址")
        .with_initial_text(cfg.ssh.host.clone())
        .interact_text()?;

    cfg.paths.remote_base = Input::new()
        .with_prompt("远端基础路径")
        .with_initial_text(cfg.paths.remote_base.clone())
        .interact_text()?;

    cfg.ssh.username = Input::new()
        .with_prompt("SSH 用户名")
        .with_initial_text(cfg.ssh.username.clone())
        .interact_text()?;

    let prompt = if cfg.ssh.password.is_empty() {
        "SSH 密码"
    } else {
        "SSH 密码（留空保持不变）"
    };
    let password = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?;
    if !password.is_empty() {
        cfg.ssh.password = password;
    }

    let target = PathBuf::from(CONFIG_FILE);
    save_config(&cfg, &target)?;
    info!("配置已保存到 {}", target.display());
    Ok(())
}
