use dashmap::DashMap;
use kanpan_core::analysis::entity::AnalysisResult;

/// # Summary
/// 进程内分析历史。每只股票一条最新在前的有界列表。
///
/// # Invariants
/// - 单只股票的记录数永不超过 `cap`，超出时截断最旧的。
/// - 仅进程生命周期内有效，不落盘。
/// - 并发安全：调度器写入与控制面读取可同时进行。
pub struct HistoryStore {
    entries: DashMap<String, Vec<AnalysisResult>>,
    cap: usize,
}

impl HistoryStore {
    /// # Summary
    /// 创建历史存储。
    ///
    /// # Arguments
    /// * `cap` - 每只股票保留的记录数，钳制到 [3, 100]。
    pub fn new(cap: usize) -> Self {
        Self {
            entries: DashMap::new(),
            cap: cap.clamp(3, 100),
        }
    }

    /// 每只股票的容量上限
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// # Summary
    /// 插入一条分析结果。
    ///
    /// # Logic
    /// 1. 插到列表头部（最新在前）。
    /// 2. 超出容量时截断尾部。
    pub fn insert(&self, code: &str, result: AnalysisResult) {
        let mut entry = self.entries.entry(code.to_string()).or_default();
        entry.insert(0, result);
        entry.truncate(self.cap);
    }

    /// # Summary
    /// 读取某只股票最近的记录，最新在前。
    ///
    /// # Arguments
    /// * `limit` - 返回条数上限。
    pub fn latest(&self, code: &str, limit: usize) -> Vec<AnalysisResult> {
        match self.entries.get(code) {
            Some(entry) => entry.iter().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// # Summary
    /// 跨全部股票取每只的最新一条，按时间倒序，截断到 `limit`。
    pub fn recent_across_all(&self, limit: usize) -> Vec<AnalysisResult> {
        let mut results: Vec<AnalysisResult> = self
            .entries
            .iter()
            .filter_map(|entry| entry.value().first().cloned())
            .collect();

        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        results.truncate(limit);
        results
    }
}
