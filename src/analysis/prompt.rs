//! 分析指令构建
//!
//! 给聊天补全后端的系统指令描述输出形状和词性规则；
//! 语法与词义按界面语言书写，例句按目标语言新造。

use crate::config::languages;

use super::service::AnalysisRequest;

/// 构建 (系统指令, 用户消息) 二元组
pub fn build_prompts(request: &AnalysisRequest) -> (String, String) {
    let ui_name = languages::display_name(&request.ui_lang).unwrap_or("English");
    let target_name = languages::display_name_or_code(&request.target_lang);
    let source_name = languages::display_name_or_code(&request.source_lang);

    let system_prompt = format!(
        r#"You are a professional linguistic analyzer. Return ONLY valid JSON, no other text.

Analyze the translated text word by word. For each word return:
{{"words":[{{"id":"w1","original":"source word","translation":"translated word","pos":"verb","grammar":"info","definition":"meaning","example":"sentence"}}]}}

STRICT RULES for pos (part of speech) — pick exactly ONE:
- "noun" — table, cat, idea
- "verb" — run, is, have
- "adjective" — big, red, beautiful
- "adverb" — quickly, very, here, now, always
- "pronoun" — I, he, this, who, nothing, everything
- "numeral" — one, first, 5
- "preposition" — in, on, at, with, from, to, for, about
- "conjunction" — and, but, or, because, that, if, when
- "particle" — not, don't, doesn't, n't, to (before verb)
- "interjection" — oh, wow, hey
- "participle" — running (adj use), broken (adj use)
- "gerund" — swimming (noun use)

IMPORTANT for each word:
- "original": the corresponding word from the SOURCE text ({source_name})
- "translation": the word from the TRANSLATED text ({target_name})
- "grammar": grammatical form details (tense, person, number, gender, case etc.) — write in {ui_name}
- "definition": brief meaning/explanation of this word — write in {ui_name}
- "example": create a NEW, ORIGINAL example sentence using this word in {target_name}. Do NOT copy from the source or translated text. Invent a completely different sentence.
- "id": sequential "w1","w2","w3"...

Match words between source and translation by meaning, not by position."#
    );

    let user_prompt = format!(
        "Source ({source_name}): \"{}\"\nTranslation ({target_name}): \"{}\"\n\nAnalyze every word in the translation. Return ONLY JSON.",
        request.source_text, request.translated_text
    );

    (system_prompt, user_prompt)
}
