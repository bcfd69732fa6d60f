use crate::qualify::QualifiedCandidate;
use crate::query::CompiledProfile;
use crate::tree::SyntaxNode;
use crate::types::ChunkRole;
use std::collections::HashMap;

/// One surviving node with its final role
#[derive(Debug, Clone)]
pub struct Classified<'t> {
    pub node: SyntaxNode<'t>,
    pub name: String,
    pub qualified_name: String,
    pub role: ChunkRole,
    pub decorated: bool,
}

/// `__name__` style identifiers
pub fn is_dunder(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// Pick one role for a node tagged by several patterns. Class-definition nodes
/// stay classes; otherwise method beats function.
pub fn resolve_role(roles: &[ChunkRole]) -> Option<ChunkRole> {
    if roles.contains(&ChunkRole::Class) {
        return Some(ChunkRole::Class);
    }
    roles
        .iter()
        .copied()
        .filter(|role| role.is_function_like())
        .max_by_key(|role| role.precedence())
}

/// Applies exclusion policy and role resolution
pub struct Classifier<'p> {
    profile: &'p CompiledProfile,
}

impl<'p> Classifier<'p> {
    pub fn new(profile: &'p CompiledProfile) -> Self {
        Self { profile }
    }

    fn excluded(&self, name: &str) -> bool {
        name.is_empty() || is_dunder(name) || self.profile.excludes_name(name)
    }

    /// Group candidates by node, drop excluded names, resolve roles.
    /// Output keeps the order of each node's first candidate.
    pub fn classify<'t>(&self, candidates: Vec<QualifiedCandidate<'t>>) -> Vec<Classified<'t>> {
        let mut order: Vec<usize> = Vec::new();
        let mut groups: HashMap<usize, Vec<QualifiedCandidate<'t>>> = HashMap::new();

        for candidate in candidates {
            let id = candidate.candidate.node.id();
            let group = groups.entry(id).or_default();
            if group.is_empty() {
                order.push(id);
            }
            group.push(candidate);
        }

        let mut out = Vec::with_capacity(order.len());
        for id in order {
            let Some(group) = groups.remove(&id) else {
                continue;
            };
            let roles: Vec<ChunkRole> = group.iter().map(|q| q.candidate.role).collect();
            let Some(first) = group.into_iter().next() else {
                continue;
            };

            let name = first.candidate.name;
            if self.excluded(&name) {
                log::trace!("excluding `{}`", first.qualified_name);
                continue;
            }
            let Some(role) = resolve_role(&roles) else {
                continue;
            };

            let node = first.candidate.node;
            out.push(Classified {
                decorated: !node.decorators().is_empty(),
                node,
                name,
                qualified_name: first.qualified_name,
                role,
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::profile::ProfileRegistry;
    use crate::qualify::NameQualifier;
    use crate::query::CaptureEngine;
    use pretty_assertions::assert_eq;

    fn classify(language: &str, source: &str) -> Vec<(String, ChunkRole, bool)> {
        let registry = ProfileRegistry::builtin().unwrap();
        let profile = CompiledProfile::compile(registry.get(language).unwrap()).unwrap();
        let tree = profile.parse(source).unwrap();
        let candidates = CaptureEngine::new(&profile).capture(&tree);
        let qualified = NameQualifier::new(&candidates, 64)
            .qualify_all(candidates, &CancellationToken::new())
            .unwrap();

        Classifier::new(&profile)
            .classify(qualified)
            .into_iter()
            .map(|c| (c.qualified_name, c.role, c.decorated))
            .collect()
    }

    #[test]
    fn test_is_dunder() {
        assert!(is_dunder("__init__"));
        assert!(is_dunder("__str__"));
        assert!(!is_dunder("_private_method"));
        assert!(!is_dunder("__private"));
        assert!(!is_dunder("trailing__"));
        assert!(!is_dunder("____"));
    }

    #[test]
    fn test_resolve_role() {
        assert_eq!(
            resolve_role(&[ChunkRole::Function, ChunkRole::Method]),
            Some(ChunkRole::Method)
        );
        assert_eq!(resolve_role(&[ChunkRole::Function]), Some(ChunkRole::Function));
        assert_eq!(
            resolve_role(&[ChunkRole::Class, ChunkRole::Function]),
            Some(ChunkRole::Class)
        );
        assert_eq!(resolve_role(&[]), None);
    }

    #[test]
    fn test_dunder_methods_are_dropped() {
        let source = "class A:\n    def __init__(self):\n        pass\n\n    def __str__(self):\n        return ''\n\n    def run(self):\n        pass\n";
        assert_eq!(
            classify("python", source),
            vec![
                ("A".to_string(), ChunkRole::Class, false),
                ("A.run".to_string(), ChunkRole::Method, false),
            ]
        );
    }

    #[test]
    fn test_decorators_keep_role() {
        let source = "class A:\n    @staticmethod\n    def s():\n        pass\n\n    @classmethod\n    def c(cls):\n        pass\n\n@staticmethod\ndef top():\n    pass\n";
        assert_eq!(
            classify("python", source),
            vec![
                ("A".to_string(), ChunkRole::Class, false),
                ("A.s".to_string(), ChunkRole::Method, true),
                ("A.c".to_string(), ChunkRole::Method, true),
                ("top".to_string(), ChunkRole::Function, true),
            ]
        );
    }

    #[test]
    fn test_typescript_method_decorators_are_siblings() {
        let source = "class A {\n  @log\n  @trace('run')\n  run() { return 1 }\n\n  stop() { return 0 }\n}\n";
        assert_eq!(
            classify("typescript", source),
            vec![
                ("A".to_string(), ChunkRole::Class, false),
                ("A.run".to_string(), ChunkRole::Method, true),
                ("A.stop".to_string(), ChunkRole::Method, false),
            ]
        );
    }

    #[test]
    fn test_class_field_functions_are_named_scopes() {
        let source = "class A {\n  handler = () => {\n    function inner() {}\n  };\n  count = 1;\n}\n";
        let expected = vec![
            ("A".to_string(), ChunkRole::Class, false),
            ("A.handler".to_string(), ChunkRole::Method, false),
            ("A.handler.inner".to_string(), ChunkRole::Function, false),
        ];
        assert_eq!(classify("typescript", source), expected);
        assert_eq!(classify("tsx", source), expected);
        assert_eq!(classify("javascript", source), expected);
    }

    #[test]
    fn test_typescript_constructor_is_excluded() {
        let source = "class C1 {\n    constructor() {}\n    m1() { return 1 }\n    static m2() { return 2 }\n}\n";
        assert_eq!(
            classify("typescript", source),
            vec![
                ("C1".to_string(), ChunkRole::Class, false),
                ("C1.m1".to_string(), ChunkRole::Method, false),
                ("C1.m2".to_string(), ChunkRole::Method, false),
            ]
        );
    }
}
