use chrono::Local;
use std::io::Write;

/// 初始化日志：时间 + 级别，默认 Info，可用 RUST_LOG 覆盖
pub fn init_logger() {
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
            writeln!(buf, "{} {:<5} {}", ts, record.level(), record.args())
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
