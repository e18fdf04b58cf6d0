use std::sync::Arc;
use std::thread;

use parley_message::{
    FormatError, MessageFormat, Meta, Part, Role, format_registry, normalize,
};
use serde_json::{Value, json};

fn parts(value: Value) -> Vec<Part> {
    serde_json::from_value(value).unwrap()
}

fn meta(value: Value) -> Meta {
    value.as_object().cloned().unwrap()
}

#[test]
fn noop_is_identity_for_every_wire_shape() {
    let input = parts(json!([
        { "type": "text", "text": "hi", "meta": { "lang": "en" } },
        { "type": "file", "filename": "a.txt", "size_bigint": 3 },
        { "type": "tool-call", "meta": { "name": "x" } },
        { "type": "data", "meta": { "ocr": "TEXT" } },
        { "type": "hologram", "frames": 12 }
    ]));
    for identifier in ["", "none"] {
        let out = normalize(identifier, "anything", &input).unwrap();
        assert_eq!(out.role, "anything");
        assert_eq!(out.parts, input);
    }
}

#[test]
fn tool_output_and_extracted_text_reach_the_output() {
    let raw = json!([
        { "type": "tool-result", "text": "42 files", "meta": { "tool_call_id": "c1" } },
        { "type": "file", "filename": "a.pdf", "text": "extracted body" }
    ]);
    let input = parts(raw.clone());

    let out = normalize("", "tool", &input).unwrap();
    assert_eq!(serde_json::to_value(&out.parts).unwrap(), raw);

    let out = normalize("openai", "tool", &input).unwrap();
    assert_eq!(out.parts[0].meta().unwrap().get("tool_call_id"), Some(&json!("c1")));
    assert_eq!(serde_json::to_value(&out.parts).unwrap(), raw);
}

#[test]
fn openai_roles_are_validated_against_the_canonical_set() {
    for role in Role::ALL {
        assert_eq!(normalize("openai", role.as_str(), &[]).unwrap().role, role.as_str());
    }
    assert!(matches!(
        normalize("openai", "human", &[]),
        Err(FormatError::InvalidRole { .. })
    ));
}

#[test]
fn openai_rename_is_idempotent_under_noop() {
    let input = vec![Part::tool_call(meta(json!({ "name": "lookup" })))];
    let first = normalize("openai", "assistant", &input).unwrap();
    assert_eq!(
        first.parts[0].meta().unwrap(),
        &meta(json!({ "name": "lookup", "tool_name": "lookup" }))
    );

    let through_noop = normalize("none", &first.role, &first.parts).unwrap();
    assert_eq!(through_noop.parts, first.parts);

    let second = normalize("openai", &first.role, &first.parts).unwrap();
    assert_eq!(second.parts, first.parts);
}

#[test]
fn anthropic_system_role_is_invalid() {
    let error = normalize("anthropic", "system", &[Part::text("be brief")]).unwrap_err();
    assert_eq!(error.to_string(), "invalid anthropic role: system");
}

#[test]
fn anthropic_no_clobber_and_missing_meta() {
    let out = normalize(
        "anthropic",
        "assistant",
        &[Part::tool_call(meta(json!({ "name": "a", "tool_name": "b" })))],
    )
    .unwrap();
    assert_eq!(out.parts[0].meta().unwrap().get("tool_name"), Some(&json!("b")));

    let error = normalize("anthropic", "user", &parts(json!([{ "type": "tool-result" }])))
        .unwrap_err();
    assert!(matches!(
        error,
        FormatError::MissingField { format: MessageFormat::Anthropic, .. }
    ));
}

#[test]
fn langchain_speaker_names_map_to_canonical_roles() {
    assert_eq!(normalize("langchain", "human", &[]).unwrap().role, "user");
    assert_eq!(normalize("langchain", "ai", &[]).unwrap().role, "assistant");
}

#[test]
fn unknown_format_is_named() {
    match format_registry().lookup("cohere") {
        Err(FormatError::UnsupportedFormat { format, .. }) => assert_eq!(format, "cohere"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("cohere must not resolve"),
    }
}

#[test]
fn output_is_deterministic_and_input_is_untouched() {
    let input = parts(json!([
        { "type": "tool-call", "meta": { "id": "toolu_1", "name": "search", "input": { "b": 1, "a": 2 } } },
        { "type": "tool-result", "meta": { "tool_use_id": "toolu_1" } }
    ]));
    let snapshot = serde_json::to_string(&input).unwrap();

    let first = normalize("anthropic", "assistant", &input).unwrap();
    let second = normalize("anthropic", "assistant", &input).unwrap();
    assert_eq!(
        serde_json::to_string(&first.parts).unwrap(),
        serde_json::to_string(&second.parts).unwrap()
    );
    assert_eq!(serde_json::to_string(&input).unwrap(), snapshot);
}

#[test]
fn concurrent_callers_sharing_input_do_not_interfere() {
    let shared = Arc::new(vec![
        Part::tool_call(meta(json!({ "name": "lookup", "input": "{}" }))),
        Part::tool_result(meta(json!({ "tool_use_id": "t" }))),
    ]);
    let expected = normalize("anthropic", "assistant", &shared).unwrap();

    let workers = (0..8)
        .map(|index| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let identifier = if index % 2 == 0 { "anthropic" } else { "openai" };
                normalize(identifier, "assistant", &shared).map(|out| (identifier, out))
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        let (identifier, out) = worker.join().unwrap().unwrap();
        if identifier == "anthropic" {
            assert_eq!(out, expected);
        } else {
            assert!(!out.parts[0].meta().unwrap().contains_key("arguments"));
        }
    }
    assert!(!shared[0].meta().unwrap().contains_key("tool_name"));
}
