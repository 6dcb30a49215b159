//! Key fan-out: one submitted channel with a multi-line key becomes one
//! channel per key.

use keyrelay_core::channel::ChannelRecord;

/// Split a credential blob into its non-empty, newline-separated keys.
///
/// A trailing `\r` is stripped from each line so CRLF pastes work. No other
/// trimming happens: a key is taken exactly as written.
pub fn split_keys(blob: &str) -> impl Iterator<Item = &str> {
    blob.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|key| !key.is_empty())
}

/// Expand a submission into one unsaved record per key, in key order.
///
/// Every record is a copy of `submitted` with its own key, `id` reset to 0
/// and `created_time` set to the given timestamp.
pub fn expand_keys(submitted: &ChannelRecord, created_time: i64) -> Vec<ChannelRecord> {
    split_keys(&submitted.key)
        .map(|key| ChannelRecord {
            id: 0,
            key: key.to_string(),
            created_time,
            ..submitted.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrelay_core::channel::ChannelStatus;

    fn submission(key: &str) -> ChannelRecord {
        ChannelRecord {
            id: 12,
            channel_type: 1,
            key: key.into(),
            name: "pool".into(),
            status: ChannelStatus::Enabled,
            weight: Some(3),
            base_url: Some("https://api.example.com".into()),
            models: "gpt-4o".into(),
            group: "default".into(),
            priority: Some(10),
            ..ChannelRecord::default()
        }
    }

    #[test]
    fn drops_empty_lines_and_keeps_order() {
        let records = expand_keys(&submission("a\nb\n\nc"), 1_700_000_000);
        let keys: Vec<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn copies_every_other_field() {
        let source = submission("k1\nk2\n");
        let records = expand_keys(&source, 1_700_000_000);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(
                *record,
                ChannelRecord {
                    id: 0,
                    key: record.key.clone(),
                    created_time: 1_700_000_000,
                    ..source.clone()
                }
            );
        }
    }

    #[test]
    fn only_separators_yields_nothing() {
        assert!(expand_keys(&submission("\n\n\n"), 0).is_empty());
        assert!(expand_keys(&submission(""), 0).is_empty());
    }

    #[test]
    fn crlf_lines_are_split_cleanly() {
        let keys: Vec<_> = split_keys("sk-1\r\nsk-2\r\n").collect();
        assert_eq!(keys, vec!["sk-1", "sk-2"]);
    }

    #[test]
    fn surrounding_spaces_are_preserved() {
        let keys: Vec<_> = split_keys(" sk-1 \nsk-2").collect();
        assert_eq!(keys, vec![" sk-1 ", "sk-2"]);
    }
}
