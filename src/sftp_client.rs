use log::{debug, warn};
use ssh2::{FileStat, OpenFlags, OpenType, Sftp};
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::TransferError;

/// 本次上传用到的 SFTP 操作面。抽成 trait 以便在测试里用内存实现代替远端
pub trait RemoteFs {
    type File: io::Write;

    /// 路径在远端是否存在（stat 成功即视为存在）
    fn exists(&self, path: &str) -> bool;
    fn mkdir(&self, path: &str) -> Result<(), ssh2::Error>;
    /// 以截断写方式创建远端文件
    fn create(&self, path: &str) -> Result<Self::File, ssh2::Error>;
    fn set_times(&self, path: &str, atime: u64, mtime: u64) -> Result<(), ssh2::Error>;
    fn set_mode(&self, path: &str, mode: u32) -> Result<(), ssh2::Error>;
}

fn empty_stat() -> FileStat {
    FileStat {
        size: None,
        uid: None,
        gid: None,
        perm: None,
        atime: None,
        mtime: None,
    }
}

impl RemoteFs for Sftp {
    type File = ssh2::File;

    fn exists(&self, path: &str) -> bool {
        self.stat(Path::new(path)).is_ok()
    }

    fn mkdir(&self, path: &str) -> Result<(), ssh2::Error> {
        Sftp::mkdir(self, Path::new(path), 0o755)
    }

    fn create(&self, path: &str) -> Result<ssh2::File, ssh2::Error> {
        let flags = OpenFlags::CREATE | OpenFlags::WRITE | OpenFlags::TRUNCATE;
        self.open_mode(Path::new(path), flags, 0o644, OpenType::File)
    }

    fn set_times(&self, path: &str, atime: u64, mtime: u64) -> Result<(), ssh2::Error> {
        self.setstat(
            Path::new(path),
            FileStat {
                atime: Some(atime),
                mtime: Some(mtime),
                ..empty_stat()
            },
        )
    }

    fn set_mode(&self, path: &str, mode: u32) -> Result<(), ssh2::Error> {
        self.setstat(
            Path::new(path),
            FileStat {
                perm: Some(mode),
                ..empty_stat()
            },
        )
    }
}

/// 逐级确保远端目录存在：stat 不到就尝试 mkdir，创建失败静默忽略。
/// 目录可能已存在或被并发创建，真正的权限问题会在写文件时暴露
pub fn ensure_remote_dir<F: RemoteFs>(fs: &F, dir: &str) {
    let mut prefix = String::new();
    for part in dir.split('/').filter(|p| !p.is_empty()) {
        prefix.push('/');
        prefix.push_str(part);
        if fs.exists(&prefix) {
            continue;
        }
        if let Err(e) = fs.mkdir(&prefix) {
            debug!("mkdir {} 被忽略: {}", prefix, e);
        }
    }
}

/// 上传单个文件：先确保远端父目录存在，再流式拷贝字节，
/// 最后尽力同步时间戳与权限位。拷贝成功即算上传成功
pub fn upload_file<F: RemoteFs>(
    fs: &F,
    local_path: &Path,
    remote_path: &str,
) -> Result<(), TransferError> {
    if let Some(dir) = parent_dir(remote_path) {
        ensure_remote_dir(fs, &dir);
    }

    let mut local = File::open(local_path).map_err(|e| TransferError::LocalOpen {
        path: local_path.to_path_buf(),
        source: e,
    })?;
    let mut remote = fs.create(remote_path).map_err(|e| TransferError::RemoteCreate {
        path: remote_path.to_string(),
        source: e,
    })?;
    io::copy(&mut local, &mut remote).map_err(|e| TransferError::Copy {
        path: remote_path.to_string(),
        source: e,
    })?;
    drop(remote);

    preserve_metadata(fs, local_path, remote_path);
    Ok(())
}

/// 远端路径的父目录，分隔符统一为正斜杠
fn parent_dir(remote_path: &str) -> Option<String> {
    let normalized = remote_path.replace('\\', "/");
    let idx = normalized.rfind('/')?;
    if idx == 0 {
        return Some("/".to_string());
    }
    Some(normalized[..idx].to_string())
}

/// 把本地文件的访问/修改时间（秒精度）与权限位应用到远端文件，
/// 全部尽力而为：失败只告警，不影响上传结果
fn preserve_metadata<F: RemoteFs>(fs: &F, local_path: &Path, remote_path: &str) {
    let meta = match std::fs::metadata(local_path) {
        Ok(m) => m,
        Err(e) => {
            warn!("读取 {} 的本地元数据失败: {}", local_path.display(), e);
            return;
        }
    };

    let atime = meta.accessed().ok().and_then(unix_secs);
    let mtime = meta.modified().ok().and_then(unix_secs);
    if let (Some(atime), Some(mtime)) = (atime, mtime) {
        if let Err(e) = fs.set_times(remote_path, atime, mtime) {
            warn!("同步 {} 的时间戳失败: {}", remote_path, e);
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode() & 0o777;
        if let Err(e) = fs.set_mode(remote_path, mode) {
            warn!("同步 {} 的权限位失败: {}", remote_path, e);
        }
    }
}

fn unix_secs(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(test)]
pub(crate) mod fake {
    use super::RemoteFs;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::io::{self, Write};
    use std::rc::Rc;

    /// 一次远端操作的记录，用于断言调用顺序
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Op {
        Stat(String),
        Mkdir(String),
        Create(String),
        SetTimes(String, u64, u64),
        SetMode(String, u32),
    }

    #[derive(Default)]
    pub struct State {
        pub dirs: BTreeSet<String>,
        pub files: BTreeMap<String, Vec<u8>>,
        pub ops: Vec<Op>,
        pub fail_mkdir: bool,
        pub fail_create: BTreeSet<String>,
        pub fail_set_times: bool,
        pub fail_set_mode: bool,
    }

    /// 内存里的远端文件系统
    #[derive(Clone, Default)]
    pub struct FakeRemote {
        pub state: Rc<RefCell<State>>,
    }

    impl FakeRemote {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ops(&self) -> Vec<Op> {
            self.state.borrow().ops.clone()
        }

        pub fn file(&self, path: &str) -> Option<Vec<u8>> {
            self.state.borrow().files.get(path).cloned()
        }

        pub fn dirs(&self) -> Vec<String> {
            self.state.borrow().dirs.iter().cloned().collect()
        }
    }

    fn sftp_err(msg: &'static str) -> ssh2::Error {
        ssh2::Error::new(ssh2::ErrorCode::SFTP(3), msg)
    }

    /// 写入先进缓冲，句柄释放时才落到 files 里，模拟远端文件句柄
    pub struct FakeFile {
        state: Rc<RefCell<State>>,
        path: String,
        buf: Vec<u8>,
    }

    impl Write for FakeFile {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for FakeFile {
        fn drop(&mut self) {
            let mut st = self.state.borrow_mut();
            let buf = std::mem::take(&mut self.buf);
            st.files.insert(std::mem::take(&mut self.path), buf);
        }
    }

    impl RemoteFs for FakeRemote {
        type File = FakeFile;

        fn exists(&self, path: &str) -> bool {
            let mut st = self.state.borrow_mut();
            st.ops.push(Op::Stat(path.to_string()));
            st.dirs.contains(path) || st.files.contains_key(path)
        }

        fn mkdir(&self, path: &str) -> Result<(), ssh2::Error> {
            let mut st = self.state.borrow_mut();
            st.ops.push(Op::Mkdir(path.to_string()));
            if st.fail_mkdir {
                return Err(sftp_err("permission denied"));
            }
            if !st.dirs.insert(path.to_string()) {
                return Err(sftp_err("file already exists"));
            }
            Ok(())
        }

        fn create(&self, path: &str) -> Result<FakeFile, ssh2::Error> {
            let mut st = self.state.borrow_mut();
            st.ops.push(Op::Create(path.to_string()));
            if st.fail_create.contains(path) {
                return Err(sftp_err("permission denied"));
            }
            Ok(FakeFile {
                state: Rc::clone(&self.state),
                path: path.to_string(),
                buf: Vec::new(),
            })
        }

        fn set_times(&self, path: &str, atime: u64, mtime: u64) -> Result<(), ssh2::Error> {
            let mut st = self.state.borrow_mut();
            st.ops.push(Op::SetTimes(path.to_string(), atime, mtime));
            if st.fail_set_times {
                return Err(sftp_err("operation unsupported"));
            }
            Ok(())
        }

        fn set_mode(&self, path: &str, mode: u32) -> Result<(), ssh2::Error> {
            let mut st = self.state.borrow_mut();
            st.ops.push(Op::SetMode(path.to_string(), mode));
            if st.fail_set_mode {
                return Err(sftp_err("operation unsupported"));
            }
            Ok(())
        }
    }
}
