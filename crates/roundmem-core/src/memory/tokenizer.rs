//! Keyword extraction and word segmentation.
//!
//! The [`Tokenizer`] trait is the seam for plugging in a real segmentation
//! library. [`SimpleTokenizer`] is a dictionary-free default: alphanumeric
//! words are split on everything else, and runs of CJK ideographs are cut
//! into overlapping bigrams. Bigrams that straddle word boundaries are
//! expected; deployments that need dictionary segmentation and TF-IDF
//! keywords should plug in a `jieba-rs` backed implementation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// Text segmentation capability consumed by relevance scoring.
pub trait Tokenizer: Send + Sync {
    /// Up to `top_k` salient keywords, most salient first.
    fn extract_keywords(&self, text: &str, top_k: usize) -> Vec<String>;

    /// Full segmentation of `text`, in order of appearance.
    fn segment(&self, text: &str) -> Vec<String>;

    /// Release any resources held by the tokenizer. Must be idempotent.
    fn release(&self) {}
}

const STOP_WORDS: &[&str] = &[
    // zh
    "的", "是", "在", "了", "和", "与", "或", "这", "那", "有", "个", "我", "你", "他", "她",
    "它", "们", "吗", "呢", "吧", "啊", "哦", "嗯", "呀", "哈", "哪", "什么", "怎么", "为什么",
    "可以", "可能", "应该", "需要", "能够", "已经", "正在", "一个", "一些", "这个", "那个",
    "这些", "那些", "如果", "但是", "因为", "所以", "虽然", "然后", "而且", "或者", "不是",
    "没有", "不会", "不能", "还是", "就是", "只是",
    // en
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have",
    "how", "in", "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was",
    "what", "when", "which", "will", "with", "why",
];

const MIN_TOKEN_CHARS: usize = 2;

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2A6DF)
}

/// Dictionary-free tokenizer with a built-in stopword list.
#[derive(Debug)]
pub struct SimpleTokenizer {
    stop_words: HashSet<&'static str>,
    released: AtomicBool,
}

impl Default for SimpleTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleTokenizer {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            released: AtomicBool::new(false),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token) || self.stop_words.contains(token.to_lowercase().as_str())
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() >= MIN_TOKEN_CHARS && !self.is_stop_word(token)
    }

    fn raw_tokens(text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut cjk_run: Vec<char> = Vec::new();

        let flush_word = |word: &mut String, tokens: &mut Vec<String>| {
            if !word.is_empty() {
                tokens.push(std::mem::take(word));
            }
        };
        let flush_cjk = |run: &mut Vec<char>, tokens: &mut Vec<String>| {
            match run.len() {
                0 => {}
                1 => tokens.push(run[0].to_string()),
                _ => {
                    for pair in run.windows(2) {
                        tokens.push(pair.iter().collect());
                    }
                }
            }
            run.clear();
        };

        for c in text.chars() {
            if is_cjk(c) {
                flush_word(&mut word, &mut tokens);
                cjk_run.push(c);
            } else if c.is_alphanumeric() {
                flush_cjk(&mut cjk_run, &mut tokens);
                word.push(c);
            } else {
                flush_word(&mut word, &mut tokens);
                flush_cjk(&mut cjk_run, &mut tokens);
            }
        }
        flush_word(&mut word, &mut tokens);
        flush_cjk(&mut cjk_run, &mut tokens);
        tokens
    }
}

impl Tokenizer for SimpleTokenizer {
    fn extract_keywords(&self, text: &str, top_k: usize) -> Vec<String> {
        let tokens = self.segment(text);

        // token -> (frequency, first position)
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
        for (pos, token) in tokens.iter().enumerate() {
            stats.entry(token.as_str()).or_insert((0, pos)).0 += 1;
        }

        let mut ranked: Vec<(&str, usize, usize)> = stats
            .into_iter()
            .map(|(token, (freq, first))| (token, freq, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(top_k)
            .map(|(token, _, _)| token.to_string())
            .collect()
    }

    fn segment(&self, text: &str) -> Vec<String> {
        Self::raw_tokens(text)
            .into_iter()
            .filter(|t| self.keep(t))
            .collect()
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            tracing::debug!("tokenizer released");
        }
    }
}
