use code_chunk_extractor::{verify_tree, ChunkRole, ChunkSet, Extractor, ExtractorConfig};
use pretty_assertions::assert_eq;

const EXAMPLE_PY: &str = include_str!("fixtures/example.py");

fn extract_py(source: &str) -> ChunkSet {
    let _ = env_logger::builder().is_test(true).try_init();
    Extractor::new(ExtractorConfig::for_indexing())
        .expect("default config is valid")
        .extract(source, "python")
        .expect("extraction failed")
}

#[test]
fn class_scenario_yields_exact_chunks() {
    let chunks = extract_py(EXAMPLE_PY);

    let scenario: Vec<_> = chunks
        .qualified_names()
        .into_iter()
        .filter(|name| name.starts_with("ExampleClass") || name.starts_with("ChildClass"))
        .collect();
    assert_eq!(
        scenario,
        vec![
            "ExampleClass",
            "ExampleClass.get_name",
            "ExampleClass.set_name",
            "ExampleClass._private_method",
            "ExampleClass.static_method",
            "ExampleClass.class_method",
            "ExampleClass.method_with_nested",
            "ExampleClass.method_with_nested.nested_helper",
            "ChildClass",
            "ChildClass.get_name",
            "ChildClass.get_age",
        ]
    );

    assert_eq!(
        chunks.qualified_names(),
        vec![
            "top_level_function",
            "calculate_sum",
            "ExampleClass",
            "ExampleClass.get_name",
            "ExampleClass.set_name",
            "ExampleClass._private_method",
            "ExampleClass.static_method",
            "ExampleClass.class_method",
            "ExampleClass.method_with_nested",
            "ExampleClass.method_with_nested.nested_helper",
            "AnotherClass",
            "AnotherClass.get_value",
            "outer_function",
            "outer_function.filter_empty",
            "outer_function.capitalize_items",
            "outer_function.process_items",
            "outer_function.process_items.add_prefix",
            "ChildClass",
            "ChildClass.get_name",
            "ChildClass.get_age",
            "create_multiplier",
            "create_multiplier.multiplier",
            "decorated_function",
        ]
    );
}

#[test]
fn chunk_tree_is_well_formed() {
    let chunks = extract_py(EXAMPLE_PY);
    verify_tree(&chunks.chunks).expect("containment and sibling checks hold");

    for (index, chunk) in chunks.iter().enumerate() {
        assert!(!chunk.name.is_empty());
        assert!(chunk.span.start_line <= chunk.span.end_line);
        assert!(chunk.span.start_byte < chunk.span.end_byte);

        match chunk.parent {
            Some(parent) => {
                assert!(parent < index);
                let parent = &chunks.chunks[parent];
                assert!(parent.span.strictly_contains(&chunk.span));
                assert!(chunk.qualified_name.starts_with(&format!("{}.", parent.qualified_name)));
            }
            None => assert_eq!(chunk.qualified_name, chunk.name),
        }
    }
}

#[test]
fn roles_follow_structural_position() {
    let chunks = extract_py(EXAMPLE_PY);
    let role = |name: &str| chunks.get(name).map(|c| c.role);

    assert_eq!(role("ExampleClass"), Some(ChunkRole::Class));
    assert_eq!(role("ExampleClass.static_method"), Some(ChunkRole::Method));
    assert_eq!(role("ExampleClass.class_method"), Some(ChunkRole::Method));
    assert_eq!(
        role("ExampleClass.method_with_nested.nested_helper"),
        Some(ChunkRole::Function)
    );
    assert_eq!(role("outer_function.process_items.add_prefix"), Some(ChunkRole::Function));
    assert_eq!(role("decorated_function"), Some(ChunkRole::Function));
}

#[test]
fn decorators_mark_chunks_without_moving_spans() {
    let chunks = extract_py(EXAMPLE_PY);

    let static_method = chunks.get("ExampleClass.static_method").unwrap();
    assert!(static_method.decorated);
    assert_eq!(
        (static_method.span.start_line, static_method.span.end_line),
        (52, 54)
    );
    assert!(static_method
        .content
        .as_deref()
        .unwrap()
        .starts_with("def static_method()"));

    assert!(chunks.get("decorated_function").unwrap().decorated);
    assert!(!chunks.get("ExampleClass.get_name").unwrap().decorated);
}

#[test]
fn extraction_is_idempotent() {
    let first = extract_py(EXAMPLE_PY);
    let second = extract_py(EXAMPLE_PY);
    assert_eq!(first, second);
    assert_eq!(first.to_json_lines().unwrap(), second.to_json_lines().unwrap());
}

#[test]
fn error_regions_are_skipped_not_fatal() {
    let source = "def good():\n    return 1\n\ndef broken(:\n    pass\n\nclass Fine:\n    def ok(self):\n        pass\n";
    let chunks = extract_py(source);
    let names = chunks.qualified_names();

    assert!(names.contains(&"good"), "{names:?}");
    assert!(!names.contains(&"broken"), "{names:?}");
    assert!(chunks.iter().all(|chunk| !chunk.name.trim().is_empty()));
    verify_tree(&chunks.chunks).unwrap();
}

#[test]
fn typescript_named_functions_only() {
    let source = r#"
export function f2() {
    ;[3, 1].sort((a, b) => a - b)
    ;(function () {})()
    const cmp = (a: number, b: number) => a - b
    return cmp(1, 2)
}

export class Service {
    constructor(private readonly name: string) {}

    run() {
        const step = () => this.name
        return step()
    }
}
"#;
    let extractor = Extractor::new(ExtractorConfig::default()).unwrap();
    let chunks = extractor.extract_str(source, Some("service.ts")).unwrap();

    let summary: Vec<_> = chunks
        .iter()
        .map(|c| (c.qualified_name.as_str(), c.role))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("f2", ChunkRole::Function),
            ("f2.cmp", ChunkRole::Function),
            ("Service", ChunkRole::Class),
            ("Service.run", ChunkRole::Method),
            ("Service.run.step", ChunkRole::Function),
        ]
    );
}

#[test]
fn elided_content_replaces_direct_children() {
    let source = "class Box:\n    def open(self):\n        def latch():\n            pass\n        latch()\n\n    def close(self):\n        pass\n";
    let chunks = extract_py(source);

    let elided = chunks.elided_content(0, source).unwrap();
    assert_eq!(
        elided,
        "class Box:\n    [...Implementation of open omitted...]\n\n    [...Implementation of close omitted...]"
    );
}

#[test]
fn records_render_one_line_per_chunk() {
    let chunks = extract_py("class A:\n    def m(self):\n        pass\n");
    assert_eq!(chunks.to_records(), "class\tA\t1\t3\nmethod\tA.m\t2\t3\n");
}

#[test]
fn junk_input_recovers_without_chunks() {
    // Grammars recover from junk with error nodes under a normal root.
    let extractor = Extractor::new(ExtractorConfig::default()).unwrap();
    for language in ["python", "javascript", "typescript"] {
        let chunks = extractor.extract(")))(((", language).unwrap();
        assert!(chunks.is_empty(), "{language}: {:?}", chunks.qualified_names());
    }
}

#[test]
fn decorated_typescript_method_is_flagged() {
    let source = "class A {\n  @log\n  run() {\n    return 1\n  }\n}\n";
    let extractor = Extractor::new(ExtractorConfig::default()).unwrap();

    for path in ["a.ts", "a.js"] {
        let chunks = extractor.extract_str(source, Some(path)).unwrap();
        let run = chunks.get("A.run").unwrap();
        assert_eq!(run.role, ChunkRole::Method, "{path}");
        assert!(run.decorated, "{path}");
        assert_eq!(run.span.end_line, 5, "{path}");
    }
}

#[test]
fn class_field_arrow_is_a_method() {
    let source = "class A {\n  handler = () => {\n    function inner() {}\n  };\n}\n";
    let extractor = Extractor::new(ExtractorConfig::default()).unwrap();
    let chunks = extractor.extract_str(source, Some("a.ts")).unwrap();

    let summary: Vec<_> = chunks
        .iter()
        .map(|c| (c.qualified_name.as_str(), c.role))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("A", ChunkRole::Class),
            ("A.handler", ChunkRole::Method),
            ("A.handler.inner", ChunkRole::Function),
        ]
    );
}
