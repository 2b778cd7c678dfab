use log::warn;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 一个待上传的本地文件：绝对路径 + 相对工作区根目录的路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub local_path: PathBuf,
    pub relative_path: String,
}

/// 拼出远端目标路径：base + '/' + relative，分隔符统一为正斜杠
pub fn remote_target(base: &str, relative: &str) -> String {
    let rel = relative.replace('\\', "/");
    let rel = rel.trim_start_matches('/');
    let base = base.trim_end_matches('/');
    format!("{}/{}", base, rel)
}

/// 收集要上传的文件。指定了 selection 时按给定顺序去重后使用，
/// 不在工作区内或不存在的条目跳过并告警；否则遍历整个工作区根目录
pub fn collect_files(root: &Path, selection: &[PathBuf]) -> Result<Vec<FileEntry>, std::io::Error> {
    let root = root.canonicalize()?;
    if selection.is_empty() {
        return Ok(walk_root(&root));
    }

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut out = Vec::new();
    for raw in selection {
        let abs = if raw.is_absolute() {
            raw.clone()
        } else {
            root.join(raw)
        };
        let abs = match abs.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                warn!("跳过 {}: {}", raw.display(), e);
                continue;
            }
        };
        if !abs.is_file() {
            warn!("跳过 {}: 不是普通文件", abs.display());
            continue;
        }
        let rel = match abs.strip_prefix(&root) {
            Ok(r) => r.to_string_lossy().replace('\\', "/"),
            Err(_) => {
                warn!("跳过 {}: 不在工作区 {} 内", abs.display(), root.display());
                continue;
            }
        };
        if !seen.insert(abs.clone()) {
            continue;
        }
        out.push(FileEntry {
            local_path: abs,
            relative_path: rel,
        });
    }
    Ok(out)
}

/// 遍历工作区根目录下的全部普通文件，跳过以 . 开头的隐藏条目，
/// 目录内按文件名排序保证顺序稳定
fn walk_root(root: &Path) -> Vec<FileEntry> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(r) => r,
            Err(_) => continue,
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        out.push(FileEntry {
            local_path: entry.path().to_path_buf(),
            relative_path: rel.to_string_lossy().replace('\\', "/"),
        });
    }
    out
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
