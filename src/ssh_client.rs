use crate::config::SshConfig;
use crate::error::ConnectError;
use log::{debug, info};
use ssh2::{DisconnectCode, Session, Sftp};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// 默认 TCP 连接超时（秒）
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// 一次上传运行独占的远端会话：SSH 连接加上同一连接上的 SFTP 通道
pub struct RemoteSession {
    session: Session,
    sftp: Sftp,
    closed: bool,
}

/// 建立 SSH 连接并完成用户名/密码认证，随后在同一连接上打开 SFTP 通道。
/// 任何一步失败都是致命的，不做内部重试
pub fn connect(cfg: &SshConfig) -> Result<RemoteSession, ConnectError> {
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS));

    let sock = addr
        .to_socket_addrs()
        .map_err(|e| ConnectError::Resolve {
            addr: addr.clone(),
            source: e,
        })?
        .next()
        .ok_or_else(|| ConnectError::Resolve {
            addr: addr.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "地址解析结果为空"),
        })?;
    let stream = TcpStream::connect_timeout(&sock, timeout).map_err(|e| ConnectError::Connect {
        addr: addr.clone(),
        source: e,
    })?;

    let mut session = Session::new().map_err(ConnectError::Session)?;
    session.set_tcp_stream(stream);
    session.handshake().map_err(ConnectError::Handshake)?;
    session
        .userauth_password(&cfg.username, &cfg.password)
        .map_err(ConnectError::Auth)?;
    if !session.authenticated() {
        return Err(ConnectError::NotAuthenticated);
    }
    debug!("SSH 已认证: {}@{}", cfg.username, addr);

    // SFTP 通道协商失败时先断开底层连接再上报
    let sftp = match session.sftp() {
        Ok(s) => s,
        Err(e) => {
            let _ = session.disconnect(
                Some(DisconnectCode::ByApplication),
                "SFTP 通道协商失败",
                None,
            );
            return Err(ConnectError::SftpChannel(e));
        }
    };

    info!("已连接到 {}:{}", cfg.host, cfg.port);
    Ok(RemoteSession {
        session,
        sftp,
        closed: false,
    })
}

impl RemoteSession {
    /// 本次运行串行复用的 SFTP 通道
    pub fn sftp(&self) -> &Sftp {
        &self.sftp
    }

    /// 断开连接；重复调用是无害的空操作
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self
            .session
            .disconnect(Some(DisconnectCode::ByApplication), "上传结束", None);
        debug!("SSH 连接已关闭");
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.close();
    }
}
