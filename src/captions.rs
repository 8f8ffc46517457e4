use std::collections::HashMap;
use std::time::Duration;

/// Identity of a caption: the slide's source and its position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptionKey {
    pub source: String,
    pub index: usize,
}

impl CaptionKey {
    pub fn new(source: impl Into<String>, index: usize) -> Self {
        Self {
            source: source.into(),
            index,
        }
    }

    /// Attribute value the host tags the caption element with.
    pub fn render(&self, separator: &str) -> String {
        format!("{}{}{}", self.source, separator, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRecord {
    pub key: CaptionKey,
    /// `key` rendered with the configured separator.
    pub tag: String,
    pub content: String,
    /// False for records registered only so lazy slides have a placeholder.
    pub has_content: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    Fade(Duration),
    Instant,
}

/// Host instruction: hide the outgoing caption, then reveal the incoming one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSwap {
    pub outgoing: Option<String>,
    pub incoming: Option<String>,
    pub fade_out: Duration,
    pub reveal: Reveal,
    pub hidden_class: String,
}

#[derive(Debug, Default)]
pub struct CaptionRegistry {
    separator: String,
    records: HashMap<CaptionKey, CaptionRecord>,
}

impl CaptionRegistry {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            records: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        key: CaptionKey,
        content: Option<&str>,
        hidden: bool,
    ) -> &CaptionRecord {
        let record = CaptionRecord {
            tag: key.render(&self.separator),
            content: content.unwrap_or_default().to_string(),
            has_content: content.is_some(),
            hidden,
            key: key.clone(),
        };
        self.records.insert(key.clone(), record);
        &self.records[&key]
    }

    pub fn get(&self, key: &CaptionKey) -> Option<&CaptionRecord> {
        self.records.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by slide index.
    pub fn records(&self) -> Vec<&CaptionRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by_key(|r| r.key.index);
        records
    }

    /// Cross-fade from `outgoing` to `incoming`, each direction taking half of `fade`.
    ///
    /// Returns `None` when neither slide has a caption record.
    pub fn swap(
        &mut self,
        outgoing: &CaptionKey,
        incoming: &CaptionKey,
        fade: Duration,
        hidden_class: &str,
    ) -> Option<CaptionSwap> {
        let half = fade / 2;
        let outgoing_tag = self.records.get_mut(outgoing).map(|r| {
            r.hidden = true;
            r.tag.clone()
        });
        let (incoming_tag, reveal) = match self.records.get_mut(incoming) {
            Some(r) => {
                r.hidden = false;
                let reveal = if r.has_content {
                    Reveal::Fade(half)
                } else {
                    Reveal::Instant
                };
                (Some(r.tag.clone()), reveal)
            }
            None => (None, Reveal::Instant),
        };
        if outgoing_tag.is_none() && incoming_tag.is_none() {
            return None;
        }
        Some(CaptionSwap {
            outgoing: outgoing_tag,
            incoming: incoming_tag,
            fade_out: half,
            reveal,
            hidden_class: hidden_class.to_string(),
        })
    }
}
