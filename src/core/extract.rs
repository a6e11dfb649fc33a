//! # Extract Store Module / 变量提取存储模块
//!
//! A run-scoped `name -> value` memory that carries values extracted from
//! one case's response into the requests of later cases. The store is an
//! explicit context object handed to each case run; writes need `&mut`,
//! so two cases can never write it concurrently without a lock.
//!
//! When backed by a file, every write rewrites the whole mapping as YAML,
//! so the file always holds one entry per name (last write wins).
//!
//! 运行期作用域内的 `名称 -> 值` 存储，将一个用例响应中提取的值传递给后续用例的请求。
//! 存储作为显式上下文对象传入每次用例运行；写入需要 `&mut`，因此不加锁就无法并发写入。
//! 若有文件支撑，每次写入都会以 YAML 重写整个映射，文件中每个名称只有一条记录（后写覆盖）。

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::assertion::display_value;
use crate::infra::t;

/// The cross-case variable store.
/// 跨用例变量存储。
#[derive(Debug, Default)]
pub struct ExtractStore {
    values: IndexMap<String, Value>,
    file: Option<PathBuf>,
}

impl ExtractStore {
    /// A store that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a file-backed store, loading whatever mapping the file already
    /// holds. A missing or blank file yields an empty store.
    ///
    /// 打开由文件支撑的存储，加载文件中已有的映射；文件不存在或为空时得到空存储。
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| t!("extract.read_failed", path = path.display()).to_string())?;
            if content.trim().is_empty() {
                IndexMap::new()
            } else {
                serde_yaml::from_str::<Option<IndexMap<String, Value>>>(&content)
                    .with_context(|| t!("extract.parse_failed", path = path.display()).to_string())?
                    .unwrap_or_default()
            }
        } else {
            IndexMap::new()
        };
        Ok(Self {
            values,
            file: Some(path),
        })
    }

    /// Creates a file-backed store that starts empty, truncating whatever
    /// the file held before without reading it.
    ///
    /// 创建一个以空状态开始的文件支撑存储，直接清空文件原有内容而不读取。
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            values: IndexMap::new(),
            file: Some(path.into()),
        };
        store.clear()?;
        Ok(store)
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Resets the store to empty and truncates the backing file.
    /// Called once at session start, before any case runs.
    ///
    /// 将存储重置为空并清空支撑文件。在会话开始、任何用例运行之前调用一次。
    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        if let Some(path) = &self.file {
            ensure_parent(path)?;
            fs::write(path, "")
                .with_context(|| t!("extract.write_failed", path = path.display()).to_string())?;
        }
        debug!("Extract store cleared");
        Ok(())
    }

    /// Records `name -> value`, replacing any earlier value, and persists the mapping.
    /// 记录 `name -> value`，覆盖先前的值，并持久化映射。
    pub fn write(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        debug!("Extract store: {name} = {value}");
        self.values.insert(name, value);
        self.persist()
    }

    /// The current contents, in first-write order.
    /// 当前内容，按首次写入顺序排列。
    pub fn read_all(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The string form used by `${extract:NAME}`: strings verbatim, other values as JSON.
    /// `${extract:NAME}` 使用的字符串形式：字符串原样输出，其余值输出为 JSON。
    pub fn get_string(&self, name: &str) -> Option<String> {
        self.values.get(name).map(display_value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        ensure_parent(path)?;
        let content = serde_yaml::to_string(&self.values)
            .with_context(|| t!("extract.serialize_failed").to_string())?;
        fs::write(path, content)
            .with_context(|| t!("extract.write_failed", path = path.display()).to_string())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| t!("extract.write_failed", path = parent.display()).to_string())?;
        }
    }
    Ok(())
}
