//! 分词与占位对齐
//!
//! 按空白切分文本，剥离词元首尾的非字母数字字符（Unicode感知），
//! 同时服务于缓存指纹（小写键）和占位词表（原始大小写）。
//! 源文与译文之间的占位对齐只按位置索引，不做语义匹配。

use std::collections::HashSet;

use crate::words::WordUnit;

/// 单个词元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 按空白切出的原始片段，保留附着标点
    pub raw: String,
    /// 剥离首尾非字母数字字符后的词干，保留大小写
    pub stem: String,
    /// 词干的小写形式，用作缓存与共享词库的键
    pub lower: String,
}

/// 剥离片段首尾的非字母数字字符
pub fn strip_edges(piece: &str) -> &str {
    piece.trim_matches(|c: char| !c.is_alphanumeric())
}

/// 把文本切分为词元序列
///
/// 空白切分，剥离后为空的片段被丢弃，顺序保持不变。
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .filter_map(|piece| {
            let stem = strip_edges(piece);
            if stem.is_empty() {
                None
            } else {
                Some(Token {
                    raw: piece.to_string(),
                    stem: stem.to_string(),
                    lower: stem.to_lowercase(),
                })
            }
        })
        .collect()
}

/// 提取去重后的小写词键，保持首次出现的顺序
pub fn distinct_keys(tokens: &[Token]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|t| seen.insert(t.lower.clone()))
        .map(|t| t.lower.clone())
        .collect()
}

/// 构建占位词表
///
/// 真实分析落地前先用译文词元生成词表，原文按相同索引对齐；
/// 索引越界时原文片段留空。
pub fn provisional_words(source_text: &str, translated_text: &str) -> Vec<WordUnit> {
    let source_tokens = tokenize(source_text);
    tokenize(translated_text)
        .into_iter()
        .enumerate()
        .map(|(i, token)| {
            let source = source_tokens
                .get(i)
                .map(|t| t.raw.clone())
                .unwrap_or_default();
            WordUnit::provisional(i, source, token.raw)
        })
        .collect()
}
