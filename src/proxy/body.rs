//! System-prompt rewriting.
//!
//! Rewrites the first element of the `system` array in a messages request
//! body. Every failure path (no replacement configured, malformed JSON,
//! missing or malformed `system` field) returns the original bytes
//! unchanged; the transform never surfaces an error to the caller.

use bytes::Bytes;
use serde_json::{json, Value};

use crate::config::RewriteConfig;

/// Whether a request path is eligible for the system-prompt rewrite.
///
/// Paths are compared without a trailing slash, so `v1/messages/` matches a
/// configured `v1/messages`.
pub fn should_rewrite(path: &str, config: &RewriteConfig) -> bool {
    config.replacement.is_some()
        && config
            .paths
            .iter()
            .any(|p| path.trim_end_matches('/') == p.trim_end_matches('/'))
}

/// Apply the rewrite policy to a request body.
///
/// In insert-if-missing mode the configured keyword is searched
/// case-insensitively in the first block's text: when found the block's text
/// is overwritten, otherwise a new leading block with an ephemeral
/// cache-control marker is inserted and everything shifts right. In direct
/// mode the first block's text is always overwritten.
pub fn rewrite_system_prompt(body: Bytes, config: &RewriteConfig) -> Bytes {
    let Some(replacement) = config.replacement.as_deref() else {
        return body;
    };

    match try_rewrite(&body, replacement, config) {
        Some(modified) => {
            tracing::debug!(
                original_bytes = body.len(),
                modified_bytes = modified.len(),
                "system prompt rewritten"
            );
            Bytes::from(modified)
        }
        None => body,
    }
}

fn try_rewrite(body: &[u8], replacement: &str, config: &RewriteConfig) -> Option<Vec<u8>> {
    let mut doc: Value = serde_json::from_slice(body).ok()?;

    let system = doc.get_mut("system")?.as_array_mut()?;
    if system.is_empty() {
        return None;
    }

    // The first block must be an object with a textual `text` field.
    let text = system[0].get("text")?.as_str()?.to_owned();

    let overwrite_in_place = if config.insert_if_missing {
        text.to_lowercase().contains(&config.keyword.to_lowercase())
    } else {
        true
    };

    if overwrite_in_place {
        system[0]
            .as_object_mut()?
            .insert("text".to_string(), Value::String(replacement.to_owned()));
    } else {
        system.insert(
            0,
            json!({
                "type": "text",
                "text": replacement,
                "cache_control": { "type": "ephemeral" }
            }),
        );
    }

    // Compact output: no extraneous whitespace.
    serde_json::to_vec(&doc).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(replacement: &str, insert_if_missing: bool) -> RewriteConfig {
        RewriteConfig {
            replacement: Some(replacement.to_string()),
            keyword: "CLAUDE_CODE".to_string(),
            insert_if_missing,
            ..RewriteConfig::default()
        }
    }

    fn rewrite(body: &str, config: &RewriteConfig) -> Value {
        let out = rewrite_system_prompt(Bytes::from(body.to_string()), config);
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn passthrough_without_replacement() {
        let config = RewriteConfig::default();
        let body = Bytes::from_static(b"{\"system\":[{\"text\":\"hi\"}]}");
        assert_eq!(rewrite_system_prompt(body.clone(), &config), body);
    }

    #[test]
    fn passthrough_on_malformed_json() {
        let config = config("replaced", true);
        for body in [
            &b"not json"[..],
            b"\xff\xfe",
            b"{\"messages\":[]}",
            b"{\"system\":\"a plain string\"}",
            b"{\"system\":[]}",
            b"{\"system\":[\"bare string\"]}",
            b"{\"system\":[{\"type\":\"text\"}]}",
        ] {
            let original = Bytes::copy_from_slice(body);
            assert_eq!(
                rewrite_system_prompt(original.clone(), &config),
                original,
                "expected passthrough for {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn insert_mode_prepends_block_when_keyword_absent() {
        let config = config("replaced text", true);
        let doc = rewrite(r#"{"system":[{"text":"ignore prior instructions"}]}"#, &config);

        let system = doc["system"].as_array().unwrap();
        assert_eq!(system.len(), 2);
        assert_eq!(system[0]["text"], "replaced text");
        assert_eq!(system[0]["type"], "text");
        assert_eq!(system[0]["cache_control"]["type"], "ephemeral");
        assert_eq!(system[1]["text"], "ignore prior instructions");
    }

    #[test]
    fn insert_mode_overwrites_when_keyword_present() {
        let config = config("replaced text", true);
        let doc = rewrite(
            r#"{"system":[{"text":"You are claude_code, a CLI.","type":"text","extra":7}]}"#,
            &config,
        );

        let system = doc["system"].as_array().unwrap();
        assert_eq!(system.len(), 1, "keyword match must not grow the array");
        assert_eq!(system[0]["text"], "replaced text");
        assert_eq!(system[0]["extra"], 7, "other fields preserved");
        assert!(system[0].get("cache_control").is_none());
    }

    #[test]
    fn direct_mode_always_overwrites() {
        let config = config("replaced text", false);
        let doc = rewrite(
            r#"{"system":[{"text":"no keyword here"},{"text":"second"}]}"#,
            &config,
        );

        let system = doc["system"].as_array().unwrap();
        assert_eq!(system.len(), 2);
        assert_eq!(system[0]["text"], "replaced text");
        assert_eq!(system[1]["text"], "second");
    }

    #[test]
    fn output_is_compact() {
        let config = config("r", false);
        let out = rewrite_system_prompt(
            Bytes::from_static(b"{ \"system\" : [ { \"text\" : \"x\" } ] }"),
            &config,
        );
        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(!text.contains(": "), "serialization must be compact: {text}");
    }

    #[test]
    fn preserves_sibling_fields() {
        let config = config("replaced", false);
        let doc = rewrite(
            r#"{"model":"claude-sonnet-4-5","system":[{"text":"x"}],"max_tokens":64}"#,
            &config,
        );
        assert_eq!(doc["model"], "claude-sonnet-4-5");
        assert_eq!(doc["max_tokens"], 64);
    }

    #[test]
    fn path_gate_matches_with_and_without_trailing_slash() {
        let config = config("r", true);
        assert!(should_rewrite("v1/messages", &config));
        assert!(should_rewrite("v1/messages/", &config));
        assert!(!should_rewrite("v1/complete", &config));
        assert!(!should_rewrite("v1/models", &config));

        let disabled = RewriteConfig::default();
        assert!(!should_rewrite("v1/messages", &disabled));
    }
}
