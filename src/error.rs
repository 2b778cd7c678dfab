use std::path::PathBuf;
use thiserror::Error;

/// 配置加载、校验与保存过程中的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("未找到配置文件 {0}，请将其放在当前目录或可执行文件同目录，或运行 `sshput configure` 生成")]
    NotFound(String),
    #[error("配置不完整，缺少 {0}，请先运行 `sshput configure`")]
    Incomplete(&'static str),
    #[error("读取配置失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("解析配置失败: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("序列化配置失败: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("读取输入失败: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// 连接阶段的错误，对整次上传是致命的
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("无法解析服务器地址 {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TCP 连接 {addr} 失败: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("创建 SSH 会话失败: {0}")]
    Session(#[source] ssh2::Error),
    #[error("SSH 握手失败: {0}")]
    Handshake(#[source] ssh2::Error),
    #[error("SSH 认证失败: {0}")]
    Auth(#[source] ssh2::Error),
    #[error("SSH未认证")]
    NotAuthenticated,
    #[error("打开 SFTP 通道失败: {0}")]
    SftpChannel(#[source] ssh2::Error),
}

/// 单个文件传输的错误，只影响该文件，不中断整批上传
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("打开本地文件 {path} 失败: {source}")]
    LocalOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("创建远端文件 {path} 失败: {source}")]
    RemoteCreate {
        path: String,
        #[source]
        source: ssh2::Error,
    },
    #[error("传输到 {path} 失败: {source}")]
    Copy {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
