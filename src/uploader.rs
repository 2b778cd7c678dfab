use log::{error, info};
use std::path::PathBuf;

use crate::config::SshConfig;
use crate::error::ConnectError;
use crate::sftp_client::{self, RemoteFs};
use crate::ssh_client;

/// 一次上传任务，运行期间只读
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub local_path: PathBuf,
    pub remote_path: String,
    /// 相对工作区根目录的路径，仅用于进度展示
    pub relative: String,
}

/// 单个文件的上传结果状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    Ok,
    Error,
    Skipped,
}

/// 单个文件的上传结果，创建后不再修改
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub status: TransferStatus,
    pub message: Option<String>,
}

/// 每个文件产生一条进度事件，由上层渲染成用户可见的输出
#[derive(Debug)]
pub struct ProgressEvent<'a> {
    /// 从 1 开始
    pub index: usize,
    pub total: usize,
    pub relative: &'a str,
    pub status: &'a TransferStatus,
    pub message: Option<&'a str>,
}

pub trait ProgressSink {
    fn report(&mut self, event: &ProgressEvent<'_>);
}

/// 默认进度汇报：逐行写日志
#[derive(Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn report(&mut self, ev: &ProgressEvent<'_>) {
        match ev.status {
            TransferStatus::Ok => info!("[{}/{}] {} ✓", ev.index, ev.total, ev.relative),
            TransferStatus::Skipped => info!(
                "[{}/{}] {} 已跳过: {}",
                ev.index,
                ev.total,
                ev.relative,
                ev.message.unwrap_or("")
            ),
            TransferStatus::Error => error!(
                "[{}/{}] {} ✗ {}",
                ev.index,
                ev.total,
                ev.relative,
                ev.message.unwrap_or("未知错误")
            ),
        }
    }
}

/// 上传结果汇总，由调用方在运行结束后统计
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn tally(results: &[TransferResult]) -> Self {
        let mut s = Summary {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            match r.status {
                TransferStatus::Ok => s.ok += 1,
                TransferStatus::Error => s.failed += 1,
                TransferStatus::Skipped => s.skipped += 1,
            }
        }
        s
    }
}

/// 执行一批上传：建立会话，逐个上传，最后关闭会话。
/// 连接失败立即中止且没有任何结果；单个文件失败只记入该文件的结果，
/// 不影响后续文件
pub fn run_batch(
    cfg: &SshConfig,
    tasks: &[TransferTask],
    sink: &mut dyn ProgressSink,
) -> Result<Vec<TransferResult>, ConnectError> {
    let mut session = ssh_client::connect(cfg)?;
    let results = upload_all(session.sftp(), tasks, sink);
    session.close();
    Ok(results)
}

/// 串行上传所有任务，每个任务恰好产生一条结果，顺序与任务一致。
/// 本地文件在枚举之后消失的任务记为跳过
fn upload_all<F: RemoteFs>(
    fs: &F,
    tasks: &[TransferTask],
    sink: &mut dyn ProgressSink,
) -> Vec<TransferResult> {
    let total = tasks.len();
    let mut results = Vec::with_capacity(total);

    for (i, task) in tasks.iter().enumerate() {
        let result = if !task.local_path.is_file() {
            TransferResult {
                local_path: task.local_path.clone(),
                remote_path: task.remote_path.clone(),
                status: TransferStatus::Skipped,
                message: Some("本地文件已不存在".to_string()),
            }
        } else {
            match sftp_client::upload_file(fs, &task.local_path, &task.remote_path) {
                Ok(()) => TransferResult {
                    local_path: task.local_path.clone(),
                    remote_path: task.remote_path.clone(),
                    status: TransferStatus::Ok,
                    message: None,
                },
                Err(e) => TransferResult {
                    local_path: task.local_path.clone(),
                    remote_path: task.remote_path.clone(),
                    status: TransferStatus::Error,
                    message: Some(e.to_string()),
                },
            }
        };

        sink.report(&ProgressEvent {
            index: i + 1,
            total,
            relative: &task.relative,
            status: &result.status,
            message: result.message.as_deref(),
        });
        results.push(result);
    }

    results
}
