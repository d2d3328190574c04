//! 状态与正文文件的读写：文本文件按 base64 解析，否则按二进制 BoC 解析。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use index_vault::cell::{Cell, boc};

pub fn read_cell(path: &Path) -> Result<Cell> {
    let raw = fs::read(path).with_context(|| format!("无法读取文件 {}", path.display()))?;
    if raw.starts_with(&boc::BOC_MAGIC.to_be_bytes()) {
        return boc::deserialize(&raw)
            .with_context(|| format!("{} 不是合法的 BoC", path.display()));
    }
    let text = String::from_utf8(raw)
        .with_context(|| format!("{} 既不是二进制 BoC 也不是文本", path.display()))?;
    boc::from_base64(text.trim())
        .with_context(|| format!("{} 不是合法的 base64 BoC", path.display()))
}

pub fn write_cell(path: Option<&Path>, cell: &Cell, force: bool) -> Result<()> {
    let encoded = boc::to_base64(cell);
    match path {
        Some(path) => {
            if path.exists() && !force {
                bail!("{} 已存在，使用 --force 覆盖", path.display());
            }
            fs::write(path, format!("{encoded}\n"))
                .with_context(|| format!("无法写入 {}", path.display()))
        }
        None => {
            println!("{encoded}");
            Ok(())
        }
    }
}
