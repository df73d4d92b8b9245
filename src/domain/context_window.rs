//! 章节上下文窗口
//!
//! 从有序章节列表中截取续写所需的最小前文，保证章节之间衔接连贯。
//! 所有长度均按 Unicode 字符计算。

use crate::domain::novel::Chapter;

/// 第一章没有前文时使用的固定标记
pub const NO_PRIOR_CONTEXT: &str = "（这是小说的第一章，没有前文。）";

/// 上一章尚未写作时，以其梗概作为前文的前缀标记
pub const PREVIOUS_SYNOPSIS_MARKER: &str = "【上一章梗概】";

/// 上一章正文少于此字符数时视为未写作
pub const DEFAULT_MIN_BODY_CHARS: usize = 50;

/// 前文最多保留的字符数
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 3000;

/// 上下文窗口配置
#[derive(Debug, Clone)]
pub struct ContextWindowConfig {
    pub min_body_chars: usize,
    pub max_context_chars: usize,
}

impl Default for ContextWindowConfig {
    fn default() -> Self {
        Self {
            min_body_chars: DEFAULT_MIN_BODY_CHARS,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

/// 构建指定位置章节的前文上下文
///
/// 策略:
/// 1. 第一章返回固定的无前文标记
/// 2. 上一章正文过短（未写作）时，使用上一章梗概
/// 3. 否则取上一章正文末尾最多 max_context_chars 个字符
pub fn build_chapter_context(
    chapters: &[Chapter],
    position: usize,
    config: &ContextWindowConfig,
) -> String {
    if position == 0 {
        return NO_PRIOR_CONTEXT.to_string();
    }

    let Some(previous) = chapters.get(position - 1) else {
        return NO_PRIOR_CONTEXT.to_string();
    };

    if previous.content_chars() < config.min_body_chars {
        return format!("{}{}", PREVIOUS_SYNOPSIS_MARKER, previous.synopsis());
    }

    tail_chars(previous.content(), config.max_context_chars).to_string()
}

/// 从 selected 开始查找第一个尚未基本写完的章节
pub fn find_streak_start(
    chapters: &[Chapter],
    selected: usize,
    written_threshold_chars: usize,
) -> Option<usize> {
    chapters
        .iter()
        .enumerate()
        .skip(selected)
        .find(|(_, c)| !c.is_substantially_written(written_threshold_chars))
        .map(|(i, _)| i)
}

/// 截取前 max_chars 个字符（用于大纲等背景信息）
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// 截取末尾 max_chars 个字符
fn tail_chars(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    match text.char_indices().nth(total - max_chars) {
        Some((byte_index, _)) => &text[byte_index..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(title: &str, body: &str) -> Chapter {
        let mut chapter = Chapter::planned(title, format!("{}的梗概", title));
        chapter.write(body.to_string());
        chapter
    }

    #[test]
    fn test_first_chapter_has_no_context() {
        let chapters = vec![written("一", &"字".repeat(100))];
        let context = build_chapter_context(&chapters, 0, &ContextWindowConfig::default());
        assert_eq!(context, NO_PRIOR_CONTEXT);
    }

    #[test]
    fn test_short_previous_body_falls_back_to_synopsis() {
        let chapters = vec![written("一", &"字".repeat(49)), Chapter::planned("二", "s")];
        let context = build_chapter_context(&chapters, 1, &ContextWindowConfig::default());
        assert_eq!(context, format!("{}一的梗概", PREVIOUS_SYNOPSIS_MARKER));
    }

    #[test]
    fn test_unwritten_previous_uses_synopsis() {
        let chapters = vec![Chapter::planned("一", "山门初开"), Chapter::planned("二", "s")];
        let context = build_chapter_context(&chapters, 1, &ContextWindowConfig::default());
        assert_eq!(context, format!("{}山门初开", PREVIOUS_SYNOPSIS_MARKER));
    }

    #[test]
    fn test_body_at_threshold_is_used_verbatim() {
        let body = "字".repeat(50);
        let chapters = vec![written("一", &body), Chapter::planned("二", "s")];
        let context = build_chapter_context(&chapters, 1, &ContextWindowConfig::default());
        assert_eq!(context, body);
    }

    #[test]
    fn test_long_body_keeps_last_3000_chars() {
        let body = format!("{}{}", "前".repeat(1000), "后".repeat(3000));
        let chapters = vec![written("一", &body), Chapter::planned("二", "s")];
        let context = build_chapter_context(&chapters, 1, &ContextWindowConfig::default());
        assert_eq!(context.chars().count(), 3000);
        assert!(context.chars().all(|c| c == '后'));
    }

    #[test]
    fn test_tail_respects_multibyte_boundaries() {
        let config = ContextWindowConfig {
            min_body_chars: 1,
            max_context_chars: 3,
        };
        let chapters = vec![written("一", "ab中文字"), Chapter::planned("二", "s")];
        assert_eq!(build_chapter_context(&chapters, 1, &config), "中文字");
    }

    #[test]
    fn test_find_streak_start_skips_written() {
        let chapters = vec![
            written("一", &"字".repeat(600)),
            written("二", &"字".repeat(600)),
            written("三", &"字".repeat(100)),
            Chapter::planned("四", "s"),
        ];
        assert_eq!(find_streak_start(&chapters, 0, 500), Some(2));
        assert_eq!(find_streak_start(&chapters, 3, 500), Some(3));
        assert_eq!(find_streak_start(&chapters, 4, 500), None);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("一二三四", 2), "一二");
        assert_eq!(excerpt("一二", 5), "一二");
    }
}
