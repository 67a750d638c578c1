//! End-to-end tests over the catalog facade: parse documents, then observe
//! resolved tasks exactly the way the executor would.

use std::sync::Arc;

use serde_json::json;
use uitask_task_catalog::{AlgorithmType, Error, Rect, TaskCatalog, MAX_TASKS};

fn catalog_with(document: serde_json::Value) -> TaskCatalog {
    let catalog = TaskCatalog::new();
    catalog.parse(&document).expect("document should parse");
    catalog
}

// =============================================================================
// Inheritance and template derivation
// =============================================================================

#[test]
fn test_plain_inheritance() {
    let catalog = catalog_with(json!({
        "P": { "roi": [1, 2, 3, 4], "next": ["Q"] },
        "Q": {},
        "C": { "baseTask": "P", "preDelay": 50 },
    }));

    let child = catalog.get("C").unwrap();
    assert_eq!(child.roi, Rect::new(1, 2, 3, 4));
    assert_eq!(child.next, vec!["Q"]);
    assert_eq!(child.pre_delay, 50);
    // the base keeps its own identity
    assert_eq!(catalog.get("P").unwrap().pre_delay, 0);
}

#[test]
fn test_implicit_template_prefix() {
    // X and Y are never declared; inherited references to them are allowed
    let catalog = catalog_with(json!({
        "A": { "next": ["X", "Y"] },
        "Z@A": {},
    }));

    let task = catalog.get("Z@A").unwrap();
    assert_eq!(task.name, "Z@A");
    assert_eq!(task.next, vec!["Z@X", "Z@Y"]);
}

#[test]
fn test_declared_template_overrides_skip_prefixing() {
    let catalog = catalog_with(json!({
        "A": { "next": ["X"] },
        "Z@A": { "next": ["W"] },
    }));
    assert_eq!(catalog.get("Z@A").unwrap().next, vec!["W"]);
}

#[test]
fn test_lazy_template_derivation() {
    let catalog = catalog_with(json!({
        "A": { "next": ["X"], "preDelay": 7 },
    }));

    // "Z@A" was never declared: derived on first lookup, interned after
    let derived = catalog.get("Z@A").unwrap();
    assert_eq!(derived.name, "Z@A");
    assert_eq!(derived.next, vec!["Z@X"]);
    assert_eq!(derived.pre_delay, 7);

    let again = catalog.get("Z@A").unwrap();
    assert!(Arc::ptr_eq(&derived, &again));

    // chains derive through every level
    let nested = catalog.get("Y@Z@A").unwrap();
    assert_eq!(nested.next, vec!["Y@Z@X"]);
}

#[test]
fn test_lookup_of_unknown_name_is_none() {
    let catalog = catalog_with(json!({ "A": {} }));
    assert!(catalog.get("Missing").is_none());
    assert!(catalog.get("Z@Missing").is_none());
}

#[test]
fn test_declared_template_with_undeclared_parent_uses_defaults() {
    // the parent lookup is not required to succeed: the declaration
    // materializes against the default prototype instead
    let catalog = catalog_with(json!({ "Z@P": { "preDelay": 3 } }));

    let task = catalog.get("Z@P").unwrap();
    assert_eq!(task.pre_delay, 3);
    assert!(task.cache);
    assert_eq!(task.algorithm(), AlgorithmType::MatchTemplate);
    assert_eq!(task.match_params().unwrap().templ_name, "Z@P.png");
    assert!(task.next.is_empty());
}

#[test]
fn test_template_parent_with_broken_base_reports_the_missing_base() {
    // "A@Q" sorts before "Q", so the template generates its parent first
    // with a tolerant lookup; the parent's failed attempt must not leave a
    // marker behind that turns the later required pass into a cycle report
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({
            "A@Q": {},
            "Q": { "baseTask": "NopeBase" },
        }))
        .unwrap_err();
    match err {
        Error::UnknownTask { name } => assert_eq!(name, "NopeBase"),
        other => panic!("expected the missing base to be reported, got {other}"),
    }

    // the failed load committed nothing
    assert!(catalog.get("A@Q").is_none());
    assert!(catalog.get("Q").is_none());
}

#[test]
fn test_base_chain_cycle_is_an_error() {
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({
            "A": { "baseTask": "B" },
            "B": { "baseTask": "A" },
        }))
        .unwrap_err();
    match err {
        Error::CyclicDefinition { name } => assert!(name == "A" || name == "B"),
        other => panic!("expected a cycle error, got {other}"),
    }
}

#[test]
fn test_unknown_base_task_is_an_error() {
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({ "C": { "baseTask": "Nope" } }))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownTask { name } if name == "Nope"));
}

// =============================================================================
// List-expression expansion
// =============================================================================

#[test]
fn test_concat_replicate_synthesizes_derived_task() {
    let catalog = catalog_with(json!({
        "A": {},
        "B": {},
        "T": { "sub": ["(A+B)*3"] },
    }));

    let task = catalog.get("T").unwrap();
    assert_eq!(task.sub, vec!["T_DERIVED_(A+B)*3"]);

    let derived = catalog.get("T_DERIVED_(A+B)*3").unwrap();
    assert_eq!(derived.algorithm(), AlgorithmType::JustReturn);
    assert_eq!(derived.sub, vec!["A", "B", "A", "B", "A", "B"]);
}

#[test]
fn test_sharp_projection_splices_in_place() {
    let catalog = catalog_with(json!({
        "X": {},
        "H": { "next": ["X"] },
        "T": { "next": ["H#next"] },
    }));
    // spliced directly, no synthetic task
    assert_eq!(catalog.get("T").unwrap().next, vec!["X"]);
}

#[test]
fn test_self_reference() {
    let catalog = catalog_with(json!({ "T": { "sub": ["#self"] } }));
    assert_eq!(catalog.get("T").unwrap().sub, vec!["T"]);
}

#[test]
fn test_back_reference() {
    let catalog = catalog_with(json!({
        "A": {},
        "T": { "sub": ["A#back"] },
    }));
    assert_eq!(catalog.get("T").unwrap().sub, vec!["A"]);
}

#[test]
fn test_duplicate_suppression_per_list_kind() {
    let catalog = catalog_with(json!({
        "A": {},
        "B": {},
        "T": {
            "next": ["A", "A", "B"],
            "sub": ["A", "A"],
            "reduceOtherTimes": ["B", "B"],
        },
    }));

    let task = catalog.get("T").unwrap();
    // flow lists are candidate sets; repetition lists keep every mention
    assert_eq!(task.next, vec!["A", "B"]);
    assert_eq!(task.sub, vec!["A", "A"]);
    assert_eq!(task.reduce_other_times, vec!["B", "B"]);
}

#[test]
fn test_projection_shares_the_suppression_set() {
    let catalog = catalog_with(json!({
        "X": {},
        "H": { "next": ["X"] },
        "T": { "next": ["X", "H#next"] },
    }));
    // the spliced X is suppressed by the one already present
    assert_eq!(catalog.get("T").unwrap().next, vec!["X"]);
}

#[test]
fn test_invalid_expression_fails_the_parse() {
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({
            "A": {},
            "B": {},
            "T": { "sub": ["A*B"] },
        }))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidExpression { .. }));

    let err = catalog
        .parse(&json!({ "T": { "sub": ["(T#self"] } }))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidExpression { .. }));
}

#[test]
fn test_empty_list_entry_fails_the_parse() {
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({ "T": { "next": [""] } }))
        .unwrap_err();
    assert!(matches!(err, Error::EmptyListEntry { .. }));
}

#[test]
fn test_expansion_is_a_fixpoint() {
    let catalog = catalog_with(json!({
        "A": {},
        "B": {},
        "T": { "sub": ["(A+B)*2"], "next": ["A", "B#back"] },
    }));

    let first = catalog.get("T").unwrap();
    let second = catalog.get("T").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let derived = catalog.get("T_DERIVED_(A+B)*2").unwrap();
    // the derived list is already concrete; re-expanding changes nothing
    assert_eq!(derived.sub, vec!["A", "B", "A", "B"]);
    assert!(Arc::ptr_eq(
        &derived,
        &catalog.get("T_DERIVED_(A+B)*2").unwrap()
    ));
}

#[test]
fn test_derivations_past_the_task_cap_are_not_interned() {
    // "#self" keeps every expansion distinct from its raw form, so each
    // resolved entity is freshly built rather than a shared raw handle
    let catalog = catalog_with(json!({ "A": { "sub": ["#self"] } }));

    // every lazy derivation interns one resolved entry; "A" already holds
    // one slot, so this fills the table exactly to the cap
    for i in 0..(MAX_TASKS - 1) {
        assert!(catalog.get(&format!("P{i}@A")).is_some());
    }

    // entries below the cap keep returning the interned entity
    let interned = catalog.get("P0@A").unwrap();
    assert!(Arc::ptr_eq(&interned, &catalog.get("P0@A").unwrap()));

    // past the cap the derivation still works, but every lookup recomputes:
    // equal by value, not the same entity
    let first = catalog.get("Overflow@A").unwrap();
    let second = catalog.get("Overflow@A").unwrap();
    assert_eq!(first.sub, vec!["Overflow@A"]);
    assert_eq!(*first, *second);
    assert!(!Arc::ptr_eq(&first, &second));
}

// =============================================================================
// Overlay documents and atomicity
// =============================================================================

#[test]
fn test_overlay_rematerializes_on_top() {
    let catalog = catalog_with(json!({
        "A": {},
        "T": { "preDelay": 100, "next": ["A"] },
    }));
    catalog
        .parse(&json!({ "T": { "postDelay": 5 } }))
        .unwrap();

    let task = catalog.get("T").unwrap();
    assert_eq!(task.pre_delay, 100);
    assert_eq!(task.post_delay, 5);
    assert_eq!(task.next, vec!["A"]);
}

#[test]
fn test_empty_base_task_resets_to_defaults() {
    let catalog = catalog_with(json!({ "T": { "preDelay": 100 } }));
    catalog
        .parse(&json!({ "T": { "baseTask": "", "postDelay": 5 } }))
        .unwrap();

    let task = catalog.get("T").unwrap();
    // the earlier same-name task is ignored, not inherited
    assert_eq!(task.pre_delay, 0);
    assert_eq!(task.post_delay, 5);
}

#[test]
fn test_failed_parse_leaves_catalog_untouched() {
    let catalog = catalog_with(json!({ "T": { "preDelay": 100 } }));
    let templates_before = catalog.templates_required();

    let err = catalog
        .parse(&json!({
            "T": { "preDelay": 1 },
            "New": {},
            "A": { "baseTask": "B" },
            "B": { "baseTask": "A" },
        }))
        .unwrap_err();
    assert!(matches!(err, Error::CyclicDefinition { .. }));

    assert_eq!(catalog.get("T").unwrap().pre_delay, 100);
    assert!(catalog.get("New").is_none());
    assert_eq!(catalog.templates_required(), templates_before);
}

#[test]
fn test_document_must_be_an_object() {
    let catalog = TaskCatalog::new();
    assert!(matches!(
        catalog.parse(&json!(["not", "a", "document"])),
        Err(Error::InvalidDocument)
    ));
}

// =============================================================================
// Templates and variant fields
// =============================================================================

#[test]
fn test_templates_required_accumulates() {
    let catalog = catalog_with(json!({
        "Banner": {},
        "Confirm": { "template": "confirm_v2.png" },
        "Words": { "algorithm": "OcrDetect", "text": ["ready"] },
    }));

    let templates = catalog.templates_required();
    assert!(templates.contains("Banner.png"));
    assert!(templates.contains("confirm_v2.png"));
    // only MatchTemplate tasks contribute
    assert!(!templates.contains("Words.png"));
}

#[test]
fn test_variant_fields_inherit_within_algorithm() {
    let catalog = catalog_with(json!({
        "Words": {
            "algorithm": "OcrDetect",
            "text": ["ready"],
            "fullMatch": true,
            "ocrReplace": [["O", "0"]],
        },
        "MoreWords": { "baseTask": "Words", "isAscii": true },
        "Picture": { "baseTask": "Words", "algorithm": "MatchTemplate" },
    }));

    let more = catalog.get("MoreWords").unwrap();
    let params = more.ocr_params().unwrap();
    assert_eq!(params.text, vec!["ready"]);
    assert!(params.full_match);
    assert!(params.is_ascii);
    assert_eq!(params.replace_map, vec![("O".to_string(), "0".to_string())]);

    // switching algorithm falls back to the defaults registry
    let picture = catalog.get("Picture").unwrap();
    let params = picture.match_params().unwrap();
    assert_eq!(params.templ_name, "Picture.png");
    assert!((params.templ_threshold - 0.8).abs() < f64::EPSILON);
}

#[test]
fn test_hash_task_fields() {
    let catalog = catalog_with(json!({
        "Snap": {
            "algorithm": "Hash",
            "hash": ["cafe", "beef"],
            "threshold": 12,
            "bound": false,
            "maskRange": [1, 250],
        },
    }));
    let params = catalog.get("Snap").unwrap().hash_params().cloned().unwrap();
    assert_eq!(params.hashes, vec!["cafe", "beef"]);
    assert_eq!(params.dist_threshold, 12);
    assert!(!params.bound);
    assert_eq!(params.mask_range, Some((1, 250)));
}

// =============================================================================
// Debug-build validation
// =============================================================================

#[test]
fn test_unknown_key_is_rejected() {
    if !cfg!(debug_assertions) {
        return;
    }
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({ "T": { "bogus": 1 } }))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownKey { name, key } if name == "T" && key == "bogus"));
}

#[test]
fn test_documentation_keys_are_allowed() {
    let catalog = catalog_with(json!({
        "T": {
            "someDoc": "keys mentioning doc pass on their own",
            "bogus": 1,
            "bogus_Doc": "explicitly documented extra",
        },
    }));
    assert!(catalog.get("T").is_some());
}

#[test]
fn test_action_specific_keys() {
    // specificRect is only meaningful for ClickRect and Swipe
    let catalog = catalog_with(json!({
        "Tap": { "action": "ClickRect", "specificRect": [5, 5, 10, 10] },
    }));
    assert_eq!(
        catalog.get("Tap").unwrap().specific_rect,
        Rect::new(5, 5, 10, 10)
    );

    if cfg!(debug_assertions) {
        let catalog = TaskCatalog::new();
        let err = catalog
            .parse(&json!({ "T": { "specificRect": [5, 5, 10, 10] } }))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownKey { .. }));
    }
}

#[test]
fn test_non_final_just_return_is_rejected() {
    if !cfg!(debug_assertions) {
        return;
    }
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({
            "J": { "algorithm": "JustReturn" },
            "K": {},
            "T": { "next": ["J", "K"] },
        }))
        .unwrap_err();
    assert!(matches!(err, Error::NonFinalJustReturn { task, .. } if task == "J"));

    // final JustReturn is fine
    let catalog = TaskCatalog::new();
    catalog
        .parse(&json!({
            "J": { "algorithm": "JustReturn" },
            "K": {},
            "T": { "next": ["K", "J"] },
        }))
        .unwrap();
}

#[test]
fn test_roi_out_of_bounds_is_rejected() {
    if !cfg!(debug_assertions) {
        return;
    }
    let catalog = TaskCatalog::new();
    let err = catalog
        .parse(&json!({ "T": { "roi": [1000, 500, 400, 300] } }))
        .unwrap_err();
    assert!(matches!(err, Error::RoiOutOfBounds { name } if name == "T"));
}

#[test]
fn test_unknown_algorithm_and_action_are_rejected() {
    let catalog = TaskCatalog::new();
    assert!(matches!(
        catalog.parse(&json!({ "T": { "algorithm": "Quantum" } })),
        Err(Error::UnknownAlgorithm { .. })
    ));
    assert!(matches!(
        catalog.parse(&json!({ "T": { "action": "Fly" } })),
        Err(Error::UnknownAction { .. })
    ));
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_lookups_observe_one_entity() {
    let catalog = Arc::new(catalog_with(json!({
        "A": { "next": ["X"] },
    })));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || catalog.get("Z@A").unwrap())
        })
        .collect();

    let tasks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for task in &tasks {
        assert_eq!(task.next, vec!["Z@X"]);
    }
    // after the race settles, lookups share the interned entity
    let settled = catalog.get("Z@A").unwrap();
    assert!(Arc::ptr_eq(&settled, &catalog.get("Z@A").unwrap()));
}
