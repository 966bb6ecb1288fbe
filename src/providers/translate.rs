//! 字面翻译后端实现
//!
//! 两个互相独立的公共翻译接口，按同一能力接入链式调用。

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};
use crate::providers::{Translation, TranslationProvider};

const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const MYMEMORY_ENDPOINT: &str = "https://api.mymemory.translated.net/get";

/// Google 网页翻译接口
///
/// 非官方的 gtx 端点，响应是嵌套数组：
/// 下标0为分段数组（每段下标0是译文），下标2为检测出的源语言。
pub struct GoogleWebTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleWebTranslator {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: GOOGLE_ENDPOINT.to_string(),
        }
    }

    /// 使用自定义端点，测试用
    pub fn with_endpoint(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

impl Default for GoogleWebTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationProvider for GoogleWebTranslator {
    fn name(&self) -> &str {
        "google-web"
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> PipelineResult<Translation> {
        let sl = if source_lang.is_empty() {
            "auto"
        } else {
            source_lang
        };
        let query = utf8_percent_encode(text, NON_ALPHANUMERIC);
        let url = format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint, sl, target_lang, query
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::provider(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let payload: Value = response.json().await?;
        let translated_text = payload
            .get(0)
            .and_then(|segments| segments.as_array())
            .map(|segments| {
                segments
                    .iter()
                    .filter_map(|segment| segment.get(0).and_then(|s| s.as_str()))
                    .collect::<String>()
            })
            .unwrap_or_default();
        let detected_lang = payload
            .get(2)
            .and_then(|lang| lang.as_str())
            .unwrap_or(sl)
            .to_string();

        if translated_text.is_empty() {
            return Err(PipelineError::provider(self.name(), "响应里没有译文"));
        }

        Ok(Translation {
            translated_text,
            detected_lang,
        })
    }
}

/// MyMemory 翻译接口
///
/// 不支持自动检测，检测语言回退为请求的源语言。
pub struct MyMemoryTranslator {
    client: reqwest::Client,
    endpoint: String,
    contact_email: String,
}

impl MyMemoryTranslator {
    pub fn new(contact_email: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: MYMEMORY_ENDPOINT.to_string(),
            contact_email,
        }
    }

    /// 使用自定义端点，测试用
    pub fn with_endpoint(endpoint: String, contact_email: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            contact_email,
        }
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryTranslator {
    fn name(&self) -> &str {
        "mymemory"
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> PipelineResult<Translation> {
        // MyMemory 的 langpair 不接受 auto，回退到英语
        let sl = if source_lang.is_empty() || source_lang == "auto" {
            "en"
        } else {
            source_lang
        };
        let langpair = format!("{}|{}", sl, target_lang);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", text),
                ("langpair", langpair.as_str()),
                ("de", self.contact_email.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PipelineError::provider(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let payload: Value = response.json().await?;
        let translated_text = payload
            .get("responseData")
            .and_then(|data| data.get("translatedText"))
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();

        if translated_text.is_empty() {
            return Err(PipelineError::provider(self.name(), "响应里没有译文"));
        }

        Ok(Translation {
            translated_text,
            detected_lang: sl.to_string(),
        })
    }
}
