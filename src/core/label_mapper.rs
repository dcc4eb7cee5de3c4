use serde::{Deserialize, Serialize};

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub id: usize,
    pub name: String,
}

/// 類別 id 與顯示名稱的固定對照表，程式啟動時建立一次後唯讀傳遞
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEnumeration {
    entries: Vec<ClassEntry>,
}

impl ClassEnumeration {
    pub fn new(mut entries: Vec<ClassEntry>) -> Self {
        entries.sort_by_key(|entry| entry.id);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ClassEntry] {
        &self.entries
    }

    /// 列舉之外的 id 一律對應到 "Unknown"，不中斷整批處理
    pub fn name_of(&self, id: usize) -> &str {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.name.as_str())
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// ids 必須是 0..k 連續編號
    pub fn is_contiguous(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(index, entry)| entry.id == index)
    }
}

impl Default for ClassEnumeration {
    fn default() -> Self {
        Self::new(vec![
            ClassEntry {
                id: 0,
                name: "Benign".to_string(),
            },
            ClassEntry {
                id: 1,
                name: "Malicious".to_string(),
            },
            ClassEntry {
                id: 2,
                name: "Adult".to_string(),
            },
        ])
    }
}
