mod config;
mod error;
mod logger;
mod sftp_client;
mod ssh_client;
mod uploader;
mod workspace;

use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use crate::uploader::{LogSink, Summary, TransferTask};

#[derive(Parser)]
#[command(name = "sshput", version, about = "A minimal CLI that defaults to 'put'")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload workspace files to the remote host
    Put {
        /// Files to upload, relative to the workspace root; all files when empty
        files: Vec<PathBuf>,
    },
    /// Interactively edit the connection settings
    Configure,
}

fn main() {
    // 初始化日志
    logger::init_logger();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Put { files: Vec::new() }) {
        Commands::Put { files } => put(files),
        Commands::Configure => {
            if let Err(e) = config::configure() {
                eprintln!("保存配置失败: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn put(files: Vec<PathBuf>) {
    // 加载配置
    let cfg = config::load_config().unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });
    if let Err(e) = cfg.check_complete() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // 收集要上传的文件
    let root = PathBuf::from(&cfg.paths.local_root);
    let entries = workspace::collect_files(&root, &files).unwrap_or_else(|e| {
        eprintln!("枚举本地文件失败: {}", e);
        std::process::exit(1);
    });

    if entries.is_empty() {
        info!("没有可上传的文件");
        return;
    }

    let tasks: Vec<TransferTask> = entries
        .iter()
        .map(|f| TransferTask {
            local_path: f.local_path.clone(),
            remote_path: workspace::remote_target(&cfg.paths.remote_base, &f.relative_path),
            relative: f.relative_path.clone(),
        })
        .collect();

    info!(
        "目标 {}@{}:{}，共 {} 个文件",
        cfg.ssh.username,
        cfg.ssh.host,
        cfg.paths.remote_base,
        tasks.len()
    );

    // 上传；连接失败中止整次运行
    let mut sink = LogSink;
    let results = uploader::run_batch(&cfg.ssh, &tasks, &mut sink).unwrap_or_else(|e| {
        eprintln!("SSH连接失败: {}", e);
        std::process::exit(1);
    });

    // 汇总
    let summary = Summary::tally(&results);
    info!(
        "上传完成: 共 {} 个，成功 {}，失败 {}，跳过 {}",
        summary.total, summary.ok, summary.failed, summary.skipped
    );
    if summary.failed > 0 {
        warn!("有 {} 个文件上传失败，请检查上方日志", summary.failed);
    }
}
