//! 共享词库存储
//!
//! 第二级缓存：按 (词, 目标语言, 界面语言) 粒度持久化已分析的词条，
//! 让不同句子甚至不同用户之间复用单词级的分析结果。
//! 存储后端是外部协作方，这里只定义边界能力和一个内存实现。

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::tokenize;
use crate::words::{PartOfSpeech, WordUnit};

/// 共享词库中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct StoredWord {
    /// 小写词键，已剥离首尾标点
    pub word_lower: String,
    pub pos: PartOfSpeech,
    pub grammar: String,
    pub definition: String,
    pub example: String,
}

impl StoredWord {
    /// 从词条派生存储行
    ///
    /// 键取译文词剥离标点后的小写形式；剥离后为空（纯标点）的词不入库。
    pub fn from_word(word: &WordUnit) -> Option<Self> {
        let key = tokenize::strip_edges(&word.target_fragment).to_lowercase();
        if key.is_empty() {
            return None;
        }
        Some(Self {
            word_lower: key,
            pos: word.part_of_speech,
            grammar: word.grammar_note.clone(),
            definition: word.definition.clone(),
            example: word.example_sentence.clone(),
        })
    }
}

/// 共享词库能力
///
/// 查询是响应路径的一部分，写入和用量上报都是射后不理的优化，
/// 失败只记日志，绝不影响已经算出的响应。
#[async_trait]
pub trait WordStore: Send + Sync {
    /// 按词键集合批量查询
    ///
    /// 返回命中的行，键为 `word_lower`；未命中的键不出现在结果里。
    async fn lookup(
        &self,
        word_keys: &[String],
        target_lang: &str,
        ui_lang: &str,
    ) -> PipelineResult<HashMap<String, StoredWord>>;

    /// 幂等地批量写入分析结果
    async fn upsert(
        &self,
        rows: Vec<StoredWord>,
        target_lang: &str,
        ui_lang: &str,
    ) -> PipelineResult<()>;

    /// 按词键集合递增使用计数
    async fn bump_usage(
        &self,
        word_keys: &[String],
        target_lang: &str,
        ui_lang: &str,
    ) -> PipelineResult<()>;
}

type StoreKey = (String, String, String);

/// 内存词库
///
/// 测试与单机运行使用；持久化后端由外部实现同一能力。
#[derive(Default)]
pub struct MemoryWordStore {
    rows: RwLock<HashMap<StoreKey, StoredWord>>,
    usage: RwLock<HashMap<StoreKey, u64>>,
}

impl MemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(word_lower: &str, target_lang: &str, ui_lang: &str) -> StoreKey {
        (
            word_lower.to_string(),
            target_lang.to_string(),
            ui_lang.to_string(),
        )
    }

    /// 读取某个词的使用计数
    pub fn usage_count(&self, word_lower: &str, target_lang: &str, ui_lang: &str) -> u64 {
        self.usage
            .read()
            .unwrap()
            .get(&Self::key(word_lower, target_lang, ui_lang))
            .copied()
            .unwrap_or(0)
    }

    /// 当前行数
    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    /// 词库是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl WordStore for MemoryWordStore {
    async fn lookup(
        &self,
        word_keys: &[String],
        target_lang: &str,
        ui_lang: &str,
    ) -> PipelineResult<HashMap<String, StoredWord>> {
        let rows = self.rows.read().unwrap();
        let mut found = HashMap::new();
        for key in word_keys {
            if let Some(row) = rows.get(&Self::key(key, target_lang, ui_lang)) {
                found.insert(key.clone(), row.clone());
            }
        }
        Ok(found)
    }

    async fn upsert(
        &self,
        new_rows: Vec<StoredWord>,
        target_lang: &str,
        ui_lang: &str,
    ) -> PipelineResult<()> {
        let mut rows = self.rows.write().unwrap();
        for row in new_rows {
            rows.insert(Self::key(&row.word_lower, target_lang, ui_lang), row);
        }
        Ok(())
    }

    async fn bump_usage(
        &self,
        word_keys: &[String],
        target_lang: &str,
        ui_lang: &str,
    ) -> PipelineResult<()> {
        let mut usage = self.usage.write().unwrap();
        for key in word_keys {
            *usage
                .entry(Self::key(key, target_lang, ui_lang))
                .or_insert(0) += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(word: &str, pos: PartOfSpeech) -> StoredWord {
        StoredWord {
            word_lower: word.to_string(),
            pos,
            grammar: format!("грам. {}", word),
            definition: String::new(),
            example: String::new(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_lookup() {
        let store = MemoryWordStore::new();
        store
            .upsert(
                vec![row("кіт", PartOfSpeech::Noun), row("бігає", PartOfSpeech::Verb)],
                "uk",
                "uk",
            )
            .await
            .unwrap();

        let keys = vec!["кіт".to_string(), "бігає".to_string(), "пес".to_string()];
        let found = store.lookup(&keys, "uk", "uk").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["бігає"].pos, PartOfSpeech::Verb);
        assert!(!found.contains_key("пес"));
    }

    #[tokio::test]
    async fn test_lookup_is_language_scoped() {
        let store = MemoryWordStore::new();
        store
            .upsert(vec![row("кіт", PartOfSpeech::Noun)], "uk", "uk")
            .await
            .unwrap();

        let keys = vec!["кіт".to_string()];
        assert!(store.lookup(&keys, "uk", "en").await.unwrap().is_empty());
        assert!(store.lookup(&keys, "ru", "uk").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryWordStore::new();
        let rows = vec![row("кіт", PartOfSpeech::Noun)];
        store.upsert(rows.clone(), "uk", "uk").await.unwrap();
        store.upsert(rows, "uk", "uk").await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_bump_usage_counts() {
        let store = MemoryWordStore::new();
        let keys = vec!["кіт".to_string()];
        store.bump_usage(&keys, "uk", "uk").await.unwrap();
        store.bump_usage(&keys, "uk", "uk").await.unwrap();
        assert_eq!(store.usage_count("кіт", "uk", "uk"), 2);
        assert_eq!(store.usage_count("кіт", "uk", "en"), 0);
    }

    #[test]
    fn test_stored_word_from_unit_strips_punctuation() {
        let word = WordUnit::provisional(0, "runs.".to_string(), "бігає.".to_string());
        let row = StoredWord::from_word(&word).unwrap();
        assert_eq!(row.word_lower, "бігає");
    }

    #[test]
    fn test_stored_word_skips_pure_punctuation() {
        let word = WordUnit::provisional(0, String::new(), "—".to_string());
        assert!(StoredWord::from_word(&word).is_none());
    }
}
