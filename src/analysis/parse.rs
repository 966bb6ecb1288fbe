//! 模型输出的容错解析
//!
//! 分析后端返回的是嵌有一个JSON对象的自由文本，常见的包装有
//! 推理段（`<think>…</think>`）和代码围栏。这里先清洗包装，
//! 再用括号深度扫描提取最外层的平衡对象，最后做词条归一化。

use regex::Regex;
use serde_json::Value;

use crate::config::constants::MIN_RAW_RESPONSE_CHARS;
use crate::error::{PipelineError, PipelineResult};
use crate::words::{PartOfSpeech, WordUnit};

/// 后端产出的未归一化词条
#[derive(Debug, Clone, Default)]
pub struct RawWord {
    pub id: String,
    pub original: String,
    pub translation: String,
    pub pos: String,
    pub grammar: String,
    pub definition: String,
    pub example: String,
}

/// 清除已知的非JSON包装
///
/// 推理段整体删除，代码围栏只删标记本身。
pub fn strip_wrappers(raw: &str) -> String {
    let think_re = Regex::new(r"(?is)<think>.*?</think>")
        .unwrap_or_else(|_| Regex::new(r"").unwrap());
    let fence_re = Regex::new(r"(?i)```(?:json)?")
        .unwrap_or_else(|_| Regex::new(r"").unwrap());

    let without_think = think_re.replace_all(raw, "");
    fence_re.replace_all(&without_think, "").trim().to_string()
}

/// 提取第一个最外层的平衡 `{…}` 对象
///
/// 按括号深度扫描而不是朴素地取首尾括号，解释性文字里的嵌套括号
/// 不会破坏提取；字符串值内部的括号与转义引号同样被跳过。
/// 存在多个顶层对象时取第一个。
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            // 只在对象内部进入字符串状态，对象外的引号是普通文字
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(s) = start {
                            return Some(&text[s..i + c.len_utf8()]);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// 把JSON值宽容地转成字符串
///
/// 字符串取原值，数字和布尔转写，空缺和null给空串。
fn coerce_str(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// 解析一次后端响应
///
/// 以下情况都算这次尝试失败：原始响应过短、找不到平衡对象、
/// JSON解析失败、`words` 数组缺失或为空。
pub fn parse_word_payload(raw: &str) -> PipelineResult<Vec<RawWord>> {
    if raw.trim().chars().count() < MIN_RAW_RESPONSE_CHARS {
        return Err(PipelineError::ParseError(format!(
            "响应过短（{}字符）",
            raw.trim().chars().count()
        )));
    }

    let cleaned = strip_wrappers(raw);
    let json_str = extract_json_object(&cleaned)
        .ok_or_else(|| PipelineError::ParseError("没有找到平衡的JSON对象".to_string()))?;
    let payload: Value = serde_json::from_str(json_str)?;

    let entries = payload
        .get("words")
        .and_then(|w| w.as_array())
        .ok_or_else(|| PipelineError::ParseError("缺少words数组".to_string()))?;
    if entries.is_empty() {
        return Err(PipelineError::ParseError("words数组为空".to_string()));
    }

    Ok(entries
        .iter()
        .map(|entry| RawWord {
            id: coerce_str(entry.get("id")),
            original: coerce_str(entry.get("original")),
            translation: coerce_str(entry.get("translation")),
            pos: coerce_str(entry.get("pos")),
            grammar: coerce_str(entry.get("grammar")),
            definition: coerce_str(entry.get("definition")),
            example: coerce_str(entry.get("example")),
        })
        .collect())
}

/// 归一化词条
///
/// 词性归一到固定集合，缺失的id按序补齐。
pub fn normalize_words(raw_words: Vec<RawWord>) -> Vec<WordUnit> {
    raw_words
        .into_iter()
        .enumerate()
        .map(|(i, raw)| WordUnit {
            id: if raw.id.is_empty() {
                format!("w{}", i + 1)
            } else {
                raw.id
            },
            source_fragment: raw.original,
            target_fragment: raw.translation,
            part_of_speech: PartOfSpeech::from_tag(&raw.pos),
            grammar_note: raw.grammar,
            definition: raw.definition,
            example_sentence: raw.example,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_extract_skips_surrounding_prose() {
        let text = r#"Here is the result: {"a":{"b":2}} hope it helps"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a":{"b":2}}"#));
    }

    #[test]
    fn test_extract_handles_braces_inside_strings() {
        let text = r#"{"note":"a } tricky { value","n":1}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_extract_handles_escaped_quotes() {
        let text = r#"{"note":"she said \"}\"","n":1}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_extract_no_object() {
        assert_eq!(extract_json_object("nothing here"), None);
        assert_eq!(extract_json_object("unbalanced { only"), None);
    }

    #[test]
    fn test_extract_first_of_multiple_objects() {
        let text = r#"{"first":1} {"second":2}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"first":1}"#));
    }

    #[test]
    fn test_strip_think_segments_and_fences() {
        let raw = "<think>let me reason {a:1}</think>\n```json\n{\"words\":[]}\n```";
        assert_eq!(strip_wrappers(raw), "{\"words\":[]}");
    }

    #[test]
    fn test_parse_rejects_short_response() {
        assert!(matches!(
            parse_word_payload("{}"),
            Err(PipelineError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_words() {
        assert!(parse_word_payload(r#"{"result": "nothing useful"}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_words() {
        assert!(parse_word_payload(r#"{"words": [], "note": "x"}"#).is_err());
    }

    #[test]
    fn test_parse_full_payload() {
        let raw = r#"```json
{"words":[{"id":"w1","original":"cat","translation":"кіт","pos":"noun","grammar":"наз. відмінок","definition":"тварина","example":"Кіт спить."}]}
```"#;
        let words = parse_word_payload(raw).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].translation, "кіт");
        assert_eq!(words[0].pos, "noun");
    }

    #[test]
    fn test_parse_coerces_non_string_fields() {
        let raw = r#"{"words":[{"id":1,"original":"one","translation":"один","pos":"numeral","grammar":null}], "padding": "x"}"#;
        let words = parse_word_payload(raw).unwrap();
        assert_eq!(words[0].id, "1");
        assert_eq!(words[0].grammar, "");
    }

    #[test]
    fn test_normalize_assigns_sequential_ids() {
        let raw = vec![RawWord::default(), RawWord::default()];
        let words = normalize_words(raw);
        assert_eq!(words[0].id, "w1");
        assert_eq!(words[1].id, "w2");
    }

    #[test]
    fn test_normalize_compound_pos() {
        let raw = vec![RawWord {
            pos: "pronoun+verb".to_string(),
            ..Default::default()
        }];
        let words = normalize_words(raw);
        assert_eq!(words[0].part_of_speech, PartOfSpeech::Pronoun);
    }
}
