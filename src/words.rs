//! 词条数据模型
//!
//! 定义分析结果中的单个词条以及固定的词性分类

use serde::{Deserialize, Serialize};

/// 词性分类
///
/// 固定的12值集合，后端输出的任何标签最终都会归一化到这里；
/// 复合标签（如 "pronoun+verb"）取第一个命中的成员，完全无法识别时落到 `Noun`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Adjective,
    Verb,
    Adverb,
    Pronoun,
    Numeral,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
    Participle,
    Gerund,
}

impl PartOfSpeech {
    /// 全部合法词性
    pub const ALL: [PartOfSpeech; 12] = [
        PartOfSpeech::Noun,
        PartOfSpeech::Adjective,
        PartOfSpeech::Verb,
        PartOfSpeech::Adverb,
        PartOfSpeech::Pronoun,
        PartOfSpeech::Numeral,
        PartOfSpeech::Preposition,
        PartOfSpeech::Conjunction,
        PartOfSpeech::Particle,
        PartOfSpeech::Interjection,
        PartOfSpeech::Participle,
        PartOfSpeech::Gerund,
    ];

    /// 词性的小写名称
    pub fn as_str(&self) -> &'static str {
        match self {
            PartOfSpeech::Noun => "noun",
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Pronoun => "pronoun",
            PartOfSpeech::Numeral => "numeral",
            PartOfSpeech::Preposition => "preposition",
            PartOfSpeech::Conjunction => "conjunction",
            PartOfSpeech::Particle => "particle",
            PartOfSpeech::Interjection => "interjection",
            PartOfSpeech::Participle => "participle",
            PartOfSpeech::Gerund => "gerund",
        }
    }

    /// 精确匹配一个已小写、已去空白的标签
    fn from_exact(tag: &str) -> Option<Self> {
        PartOfSpeech::ALL.iter().copied().find(|p| p.as_str() == tag)
    }

    /// 把后端输出的任意词性标签归一化为合法成员
    ///
    /// 小写并去除首尾空白后先做精确匹配；不匹配时按 `+` `/` `,` 和空白切分，
    /// 从左到右取第一个命中的分段；全部落空时返回 `Noun`。
    pub fn from_tag(raw: &str) -> Self {
        let tag = raw.trim().to_lowercase();
        if let Some(pos) = Self::from_exact(&tag) {
            return pos;
        }
        tag.split(|c: char| matches!(c, '+' | '/' | ',') || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .find_map(Self::from_exact)
            .unwrap_or(PartOfSpeech::Noun)
    }
}

impl Default for PartOfSpeech {
    fn default() -> Self {
        PartOfSpeech::Noun
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 分析结果中的单个词条
///
/// 每次分析请求整体生成、整体替换，返回后不再原地修改。
/// 序列化字段名沿用线上分析接口的命名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordUnit {
    /// 稳定的序号标识，形如 "w1"、"w2"
    pub id: String,

    /// 对齐到的原文片段，可能为空
    #[serde(rename = "original", default)]
    pub source_fragment: String,

    /// 译文中的词，含附着标点
    #[serde(rename = "translation")]
    pub target_fragment: String,

    /// 词性，恒为12值集合中的一个
    #[serde(rename = "pos")]
    pub part_of_speech: PartOfSpeech,

    /// 语法形态说明，使用界面语言书写
    #[serde(rename = "grammar", default)]
    pub grammar_note: String,

    /// 词义简述，使用界面语言书写
    #[serde(rename = "definition", default)]
    pub definition: String,

    /// 新造的目标语言例句
    #[serde(rename = "example", default)]
    pub example_sentence: String,
}

impl WordUnit {
    /// 创建只有位置信息的占位词条
    ///
    /// 真实分析结果到达之前先给界面一个可悬停的词表，
    /// 默认词性为名词，语法字段全部留空。
    pub fn provisional(index: usize, source_fragment: String, target_fragment: String) -> Self {
        Self {
            id: format!("w{}", index + 1),
            source_fragment,
            target_fragment,
            part_of_speech: PartOfSpeech::Noun,
            grammar_note: String::new(),
            definition: String::new(),
            example_sentence: String::new(),
        }
    }
}
