//! 进程内分析缓存层
//!
//! 以归一化指纹为键缓存整句的分析结果。
//! 容量达到上限时淘汰最早插入的条目（插入序淘汰，不是LRU）；
//! 过期检查在读取时惰性进行，不做主动清扫。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::words::WordUnit;

/// 计算缓存指纹
///
/// 译文去首尾空白并大小写折叠后，与目标语言、界面语言拼成三元组键。
/// 同一句译文无论大小写与首尾空白如何变化都命中同一条目。
pub fn fingerprint(translated_text: &str, target_lang: &str, ui_lang: &str) -> String {
    format!(
        "{}:{}:{}",
        target_lang,
        ui_lang,
        translated_text.trim().to_lowercase()
    )
}

/// 缓存条目
#[derive(Debug, Clone)]
struct CacheEntry {
    words: Vec<WordUnit>,
    inserted_at: Instant,
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// 插入顺序，队首即最旧条目
    order: VecDeque<String>,
}

/// 进程内分析缓存
///
/// 构造时确定容量与TTL，进程生命周期内单例注入。
/// 读写都是短临界区的原子map操作，不跨越任何挂起点。
pub struct AnalysisCache {
    inner: RwLock<CacheInner>,
    max_entries: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl AnalysisCache {
    /// 使用指定容量和TTL创建缓存
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            max_entries: max_entries.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// 查询缓存
    ///
    /// 已过期的条目在这里被删除并按未命中处理。
    pub fn get(&self, key: &str) -> Option<Vec<WordUnit>> {
        let mut inner = self.inner.write().unwrap();

        if let Some(entry) = inner.entries.get(key) {
            if entry.inserted_at.elapsed() <= self.ttl {
                let words = entry.words.clone();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(words);
            }
            // 惰性删除过期条目
            inner.entries.remove(key);
            inner.order.retain(|k| k.as_str() != key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// 写入缓存
    ///
    /// 已存在的键原地覆盖并移到队尾；容量已满时先淘汰最早插入的一条。
    pub fn insert(&self, key: String, words: Vec<WordUnit>) {
        let mut inner = self.inner.write().unwrap();

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else if inner.entries.len() >= self.max_entries {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                words,
                inserted_at: Instant::now(),
            },
        );
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().entries.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空缓存
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.entries.clear();
        inner.order.clear();
    }

    /// 检查键是否存在且未过期
    pub fn contains_key(&self, key: &str) -> bool {
        let inner = self.inner.read().unwrap();
        inner
            .entries
            .get(key)
            .map(|e| e.inserted_at.elapsed() <= self.ttl)
            .unwrap_or(false)
    }

    /// 获取统计快照
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::PartOfSpeech;

    fn word(target: &str) -> WordUnit {
        WordUnit {
            id: "w1".to_string(),
            source_fragment: String::new(),
            target_fragment: target.to_string(),
            part_of_speech: PartOfSpeech::Noun,
            grammar_note: String::new(),
            definition: String::new(),
            example_sentence: String::new(),
        }
    }

    #[test]
    fn test_fingerprint_normalization_idempotence() {
        let base = fingerprint("Кіт бігає.", "uk", "uk");
        assert_eq!(fingerprint("  Кіт бігає.  ", "uk", "uk"), base);
        assert_eq!(fingerprint("КІТ БІГАЄ.", "uk", "uk"), base);
        assert_eq!(fingerprint(&"Кіт бігає.".trim().to_string(), "uk", "uk"), base);
    }

    #[test]
    fn test_fingerprint_separates_language_pairs() {
        assert_ne!(
            fingerprint("hello", "uk", "uk"),
            fingerprint("hello", "uk", "en")
        );
    }

    #[test]
    fn test_basic_insert_and_get() {
        let cache = AnalysisCache::new(10, Duration::from_secs(60));
        cache.insert("k1".to_string(), vec![word("кіт")]);
        assert_eq!(cache.get("k1").unwrap()[0].target_fragment, "кіт");
        assert!(cache.get("k2").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_ttl_expiry_is_lazy() {
        let cache = AnalysisCache::new(10, Duration::from_millis(50));
        cache.insert("k1".to_string(), vec![word("кіт")]);

        // TTL内的读取命中
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("k1").is_some());

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.len(), 1); // 没有主动清扫
        assert!(cache.get("k1").is_none());
        assert_eq!(cache.len(), 0); // 读取时才删除
    }

    #[test]
    fn test_bounded_size_evicts_oldest_inserted() {
        let cache = AnalysisCache::new(3, Duration::from_secs(60));
        for i in 0..4 {
            cache.insert(format!("k{}", i), vec![word("x")]);
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get("k0").is_none()); // 最早插入的被淘汰
        assert!(cache.get("k1").is_some());
        assert!(cache.get("k3").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_ignores_read_order() {
        // 插入序淘汰：读取不会给条目续命
        let cache = AnalysisCache::new(2, Duration::from_secs(60));
        cache.insert("a".to_string(), vec![word("x")]);
        cache.insert("b".to_string(), vec![word("y")]);
        cache.get("a");
        cache.insert("c".to_string(), vec![word("z")]);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_reinsert_moves_key_to_back() {
        let cache = AnalysisCache::new(2, Duration::from_secs(60));
        cache.insert("a".to_string(), vec![word("x")]);
        cache.insert("b".to_string(), vec![word("y")]);
        cache.insert("a".to_string(), vec![word("x2")]);
        cache.insert("c".to_string(), vec![word("z")]);
        assert!(cache.get("b").is_none()); // b成为最旧条目
        assert_eq!(cache.get("a").unwrap()[0].target_fragment, "x2");
    }
}
