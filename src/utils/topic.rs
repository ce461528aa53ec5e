//! MQTT 主题模板解析
//!
//! 模板形如 `/{apikey}/{serial}/{type}`，由 `/` 分隔的段组成，
//! 每段是占位符 `{name}` 或字面量（`\w+`）。

use crate::errors::AppError;
use once_cell::sync::Lazy;
use regex::Regex;

static TEMPLATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(\{[a-zA-Z_][a-zA-Z0-9_]*\}|\w+)(/(\{[a-zA-Z_][a-zA-Z0-9_]*\}|\w+))*$")
        .expect("static regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// 已校验的主题模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTemplate {
    segments: Vec<Segment>,
}

/// 从主题中提取的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFields {
    pub apikey: String,
    pub serial: String,
    pub kind: Option<String>,
}

impl TopicTemplate {
    /// 解析并校验模板，必须包含 `{apikey}` 与 `{serial}`
    pub fn parse(template: &str) -> Result<Self, AppError> {
        if !TEMPLATE_REGEX.is_match(template) {
            return Err(AppError::BadRequest(
                "topicFormat 格式无效（例：/{apikey}/{serial}/{type}）".to_string(),
            ));
        }

        let segments: Vec<Segment> = template
            .trim_start_matches('/')
            .split('/')
            .map(|seg| match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Placeholder(name.to_string()),
                None => Segment::Literal(seg.to_string()),
            })
            .collect();

        let has = |name: &str| {
            segments
                .iter()
                .any(|s| matches!(s, Segment::Placeholder(p) if p == name))
        };
        if !has("apikey") || !has("serial") {
            return Err(AppError::BadRequest(
                "topicFormat 必须包含 {apikey} 和 {serial}".to_string(),
            ));
        }

        Ok(Self { segments })
    }

    /// 按模板逐段匹配主题并提取字段
    ///
    /// 多余的尾部段拼接到 `type` 上；字面量段必须完全一致。
    pub fn extract(&self, topic: &str) -> Result<TopicFields, AppError> {
        let parts: Vec<&str> = match topic.strip_prefix('/') {
            Some(rest) => rest.split('/').collect(),
            None => return Err(mismatch(topic)),
        };
        if parts.len() < self.segments.len() {
            return Err(mismatch(topic));
        }

        let mut apikey = None;
        let mut serial = None;
        let mut kind = None;

        for (segment, part) in self.segments.iter().zip(parts.iter()) {
            match segment {
                Segment::Literal(lit) if lit != part => return Err(mismatch(topic)),
                Segment::Literal(_) => {}
                Segment::Placeholder(_) if part.is_empty() => return Err(mismatch(topic)),
                Segment::Placeholder(name) => match name.as_str() {
                    "apikey" => apikey = Some(part.to_string()),
                    "serial" => serial = Some(part.to_string()),
                    "type" => kind = Some(part.to_string()),
                    _ => {}
                },
            }
        }

        let rest = &parts[self.segments.len()..];
        if !rest.is_empty() {
            let tail = rest.join("/");
            kind = Some(match kind {
                Some(k) => format!("{}/{}", k, tail),
                None => tail,
            });
        }

        match (apikey, serial) {
            (Some(apikey), Some(serial)) => Ok(TopicFields {
                apikey,
                serial,
                kind,
            }),
            _ => Err(mismatch(topic)),
        }
    }
}

fn mismatch(topic: &str) -> AppError {
    AppError::BadRequest(format!("主题 {} 与服务器的 topicFormat 不匹配", topic))
}
